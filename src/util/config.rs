//! Configuration file support for psp-build.
//!
//! Two configuration file locations are consulted:
//! - Global: `~/.psp-build/config.toml` - User-wide defaults
//! - Project: `psp-build.toml` in the project root - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::{DriverError, DriverResult};
use crate::util::fs::absolute_path;

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "psp-build.toml";

/// Default parent directory of the per-configuration build directories.
pub const DEFAULT_BUILD_ROOT: &str = "build";

/// Default CMake generator.
pub const DEFAULT_GENERATOR: &str = "Ninja";

/// Default generator program.
pub const DEFAULT_GENERATOR_PROGRAM: &str = "cmake";

/// Default build tool.
pub const DEFAULT_BUILD_TOOL: &str = "ninja";

/// Default memory-checking harness.
pub const DEFAULT_HARNESS: &str = "valgrind";

/// Default test binary location, relative to the build directory.
pub const DEFAULT_TEST_BINARY: &str = "install/psp_test";

/// psp-build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Test stage settings
    pub test: TestConfig,

    /// Memory-checking harness settings
    pub harness: HarnessConfig,
}

/// Generator and build tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Parent of the per-configuration build directories
    pub root: Option<PathBuf>,

    /// CMake generator name (passed to `-G`)
    pub generator: Option<String>,

    /// Generator program (e.g., /usr/local/bin/cmake)
    pub generator_program: Option<PathBuf>,

    /// Build tool run after generation (e.g., ninja)
    pub build_tool: Option<PathBuf>,

    /// Directory holding the project description (CMakeLists.txt)
    pub source_dir: Option<PathBuf>,
}

/// Test stage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    /// Test binary, relative to the build directory
    pub binary: Option<PathBuf>,
}

/// Memory-checking harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Harness program (e.g., valgrind)
    pub program: Option<PathBuf>,
}

/// Fully resolved driver settings, with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSettings {
    /// Absolute or project-relative parent of build directories
    pub build_root: PathBuf,
    /// Source directory handed to the generator
    pub source_dir: PathBuf,
    /// CMake generator name
    pub generator: String,
    /// Generator program
    pub generator_program: PathBuf,
    /// Build tool program
    pub build_tool: PathBuf,
    /// Test binary, relative to the build directory
    pub test_binary: PathBuf,
    /// Memory-checking harness program
    pub harness: PathBuf,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> DriverResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|e| DriverError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Load configuration, treating a missing file as empty.
    pub fn load_if_exists(path: &Path) -> DriverResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config file at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Build settings
        if other.build.root.is_some() {
            self.build.root = other.build.root;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.generator_program.is_some() {
            self.build.generator_program = other.build.generator_program;
        }
        if other.build.build_tool.is_some() {
            self.build.build_tool = other.build.build_tool;
        }
        if other.build.source_dir.is_some() {
            self.build.source_dir = other.build.source_dir;
        }

        // Test settings
        if other.test.binary.is_some() {
            self.test.binary = other.test.binary;
        }

        // Harness settings
        if other.harness.program.is_some() {
            self.harness.program = other.harness.program;
        }
    }

    /// Resolve settings against the project root.
    ///
    /// The project root is made absolute first. Relative `root` and
    /// `source-dir` values, and program paths with a directory part, are taken
    /// relative to it, so children started inside the build directory see the
    /// same files as the caller. Bare program names are left for PATH lookup.
    pub fn settings(&self, project_root: &Path) -> DriverSettings {
        let project_root = absolute_path(project_root);

        let build_root = self
            .build
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_ROOT));
        let source_dir = match &self.build.source_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.clone(),
        };

        DriverSettings {
            build_root: project_root.join(build_root),
            source_dir,
            generator: self
                .build
                .generator
                .clone()
                .unwrap_or_else(|| DEFAULT_GENERATOR.to_string()),
            generator_program: program_path(
                &project_root,
                self.build.generator_program.as_deref(),
                DEFAULT_GENERATOR_PROGRAM,
            ),
            build_tool: program_path(
                &project_root,
                self.build.build_tool.as_deref(),
                DEFAULT_BUILD_TOOL,
            ),
            test_binary: self
                .test
                .binary
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_BINARY)),
            harness: program_path(
                &project_root,
                self.harness.program.as_deref(),
                DEFAULT_HARNESS,
            ),
        }
    }
}

/// A configured program, or the default name.
///
/// A bare name stays as-is for PATH lookup; a relative path with a directory
/// part is anchored at the project root.
fn program_path(project_root: &Path, configured: Option<&Path>, default: &str) -> PathBuf {
    match configured {
        Some(program) if program.is_relative() && program.components().count() > 1 => {
            project_root.join(program)
        }
        Some(program) => program.to_path_buf(),
        None => PathBuf::from(default),
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Config::default().settings(Path::new("."))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (psp-build.toml)
/// 2. Global config (~/.psp-build/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_root: &Path) -> DriverResult<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_if_exists(global_path)?);
    }

    config.merge(Config::load_if_exists(
        &project_root.join(PROJECT_CONFIG_FILE),
    )?);

    Ok(config)
}

/// Get the global psp-build config directory (~/.psp-build).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".psp-build"))
}

/// Get the global config path (~/.psp-build/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
