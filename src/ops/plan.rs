//! Resolved build plans and the configuration matrix.
//!
//! A plan is what the pipeline would do for one {compiler, variant} pair,
//! rendered without running anything: the `resolve` and `matrix` commands
//! print these.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::cmake::CMakeInvocation;
use crate::builder::context::{resolve, BuildContext, SkipReason};
use crate::builder::toolchain::CompilerIdentity;
use crate::builder::variant::{BuildVariant, OptimizationMode};
use crate::util::config::DriverSettings;

/// Everything the pipeline would run for a resolved context.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub compiler: CompilerIdentity,
    pub variant: BuildVariant,
    pub build_type: OptimizationMode,
    pub compiler_flags: &'static str,
    pub cc: &'static str,
    pub cxx: &'static str,
    pub definitions: &'static [&'static str],
    pub build_dir: PathBuf,
    /// Set when the pipeline stops before the test stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,
    /// Generator command line, absent for unsupported pairs
    pub generate: Option<String>,
    /// Build tool command line, absent for unsupported pairs
    pub build: Option<String>,
    /// Test command line, absent when there is no test stage
    pub test: Option<String>,
}

impl BuildPlan {
    /// Build the plan for a resolved context.
    pub fn new(ctx: &BuildContext) -> Self {
        let cmake = CMakeInvocation::new(ctx);
        let buildable = ctx.skip.is_none();

        let skip = ctx.skip.or_else(|| {
            (!ctx.compiler.is_native()).then_some(SkipReason::CrossCompiled)
        });

        BuildPlan {
            compiler: ctx.compiler,
            variant: ctx.variant,
            build_type: ctx.profile.optimization,
            compiler_flags: ctx.profile.compiler_flags,
            cc: ctx.toolchain.cc,
            cxx: ctx.toolchain.cxx,
            definitions: ctx.toolchain.definitions,
            build_dir: ctx.build_dir.clone(),
            skip,
            generate: buildable.then(|| cmake.configure_command().display_command()),
            build: buildable.then(|| cmake.build_command().display_command()),
            test: ctx
                .has_test_stage()
                .then(|| ctx.test_command().display_command()),
        }
    }
}

/// One row of the configuration matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixEntry {
    pub compiler: CompilerIdentity,
    pub variant: BuildVariant,
    pub build_dir: PathBuf,
    /// Whether the pair builds at all
    pub supported: bool,
    /// Whether the output is cross-compiled (no test stage)
    pub cross: bool,
    /// Whether the test runs under the memory-checking harness
    pub memcheck: bool,
}

/// Every {compiler, variant} pair, compiler-major.
pub fn matrix(settings: &DriverSettings) -> Vec<MatrixEntry> {
    CompilerIdentity::ALL
        .into_iter()
        .flat_map(|compiler| {
            BuildVariant::ALL.into_iter().map(move |variant| {
                let ctx = resolve(compiler, variant, settings);
                MatrixEntry {
                    compiler,
                    variant,
                    supported: ctx.skip.is_none(),
                    cross: !compiler.is_native(),
                    memcheck: variant.needs_memcheck(),
                    build_dir: ctx.build_dir,
                }
            })
        })
        .collect()
}
