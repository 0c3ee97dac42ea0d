//! Build context - compiler, variant, and directory configuration.
//!
//! A [`BuildContext`] is resolved once per invocation from the two external
//! selectors and never changes afterwards. Every stage of the pipeline reads
//! from it; none of them look at the environment again.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::errors::{DriverError, DriverResult};
use crate::builder::test_command::select_test_command;
use crate::builder::toolchain::{CompilerIdentity, ToolchainProfile};
use crate::builder::variant::{BuildVariant, VariantProfile};
use crate::util::config::DriverSettings;
use crate::util::process::ProcessBuilder;

/// Environment variable selecting the compiler identity.
pub const COMPILER_ENV: &str = "Compiler";

/// Environment variable selecting the build variant.
pub const VARIANT_ENV: &str = "BuildType";

/// Why a pipeline stops early with success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// The compiler cannot build this variant at all.
    UnsupportedPair { reason: &'static str },
    /// The toolchain emits non-native output, so there is no test to run.
    CrossCompiled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedPair { reason } => f.write_str(reason),
            SkipReason::CrossCompiled => f.write_str("cross-compiled output has no test stage"),
        }
    }
}

/// Build context containing the resolved toolchain, variant, and paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Compiler identity
    pub compiler: CompilerIdentity,

    /// Build variant
    pub variant: BuildVariant,

    /// Compiler binaries and definitions
    pub toolchain: ToolchainProfile,

    /// Optimization mode and flags
    pub profile: VariantProfile,

    /// Build directory, unique to the {compiler, variant} pair
    pub build_dir: PathBuf,

    /// Set when the pair is declared unsupported
    pub skip: Option<SkipReason>,

    /// Driver settings (generator, build tool, test binary, harness)
    pub settings: DriverSettings,
}

/// Reason a {compiler, variant} pair cannot be built, if any.
pub fn unsupported_reason(
    compiler: CompilerIdentity,
    variant: BuildVariant,
) -> Option<&'static str> {
    match (compiler, variant) {
        (CompilerIdentity::Gcc, BuildVariant::Msan) => {
            Some("gcc does not implement MemorySanitizer")
        }
        _ => None,
    }
}

/// Directory name for a {compiler, variant} pair.
pub fn build_dir_name(compiler: CompilerIdentity, variant: BuildVariant) -> String {
    format!("{}-{}", compiler.as_str(), variant.slug())
}

/// Resolve a compiler and variant into a build context.
pub fn resolve(
    compiler: CompilerIdentity,
    variant: BuildVariant,
    settings: &DriverSettings,
) -> BuildContext {
    let build_dir = settings
        .build_root
        .join(build_dir_name(compiler, variant));
    let skip = unsupported_reason(compiler, variant)
        .map(|reason| SkipReason::UnsupportedPair { reason });

    let ctx = BuildContext {
        compiler,
        variant,
        toolchain: compiler.profile(),
        profile: variant.profile(),
        build_dir,
        skip,
        settings: settings.clone(),
    };

    tracing::debug!(
        compiler = %ctx.compiler,
        variant = %ctx.variant,
        build_dir = %ctx.build_dir.display(),
        "resolved build context"
    );

    ctx
}

/// Resolve a build context from raw selector values.
///
/// A missing selector is an environment error; a value outside the known
/// set is a configuration error. Neither falls back to a default.
pub fn resolve_selectors(
    compiler: Option<&str>,
    variant: Option<&str>,
    settings: &DriverSettings,
) -> DriverResult<BuildContext> {
    let compiler = compiler.ok_or(DriverError::MissingSelector {
        name: COMPILER_ENV,
        flag: "--compiler",
    })?;
    let variant = variant.ok_or(DriverError::MissingSelector {
        name: VARIANT_ENV,
        flag: "--variant",
    })?;

    Ok(resolve(compiler.parse()?, variant.parse()?, settings))
}

impl BuildContext {
    /// Build directory for this context.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Absolute path of the test binary this build produces.
    pub fn test_binary(&self) -> PathBuf {
        self.build_dir.join(&self.settings.test_binary)
    }

    /// Command that runs the test binary for this variant.
    pub fn test_command(&self) -> ProcessBuilder {
        select_test_command(self.variant, &self.test_binary(), &self.settings.harness)
            .cwd(&self.build_dir)
    }

    /// Whether the pipeline runs a test stage at all.
    pub fn has_test_stage(&self) -> bool {
        self.skip.is_none() && self.compiler.is_native()
    }
}
