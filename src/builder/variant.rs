//! Build variants and the flags each one maps to.
//!
//! A variant is the abstract name CI asks for (`Release`, `Asan`, ...). Each
//! variant resolves to an underlying CMake build type plus an opaque
//! `CMAKE_CXX_FLAGS` string that is passed through verbatim.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::builder::errors::DriverError;

/// A named build configuration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildVariant {
    Release,
    Debug,
    Asan,
    Msan,
    Tsan,
    Valgrind,
    ValgrindDbg,
}

/// The CMake build type a variant compiles under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptimizationMode {
    Release,
    Debug,
}

impl OptimizationMode {
    /// Value for `-DCMAKE_BUILD_TYPE`.
    pub fn as_cmake_build_type(&self) -> &'static str {
        match self {
            OptimizationMode::Release => "Release",
            OptimizationMode::Debug => "Debug",
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cmake_build_type())
    }
}

/// Resolved parameters for a build variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantProfile {
    /// Underlying CMake build type
    pub optimization: OptimizationMode,
    /// Compiler flags, possibly empty
    pub compiler_flags: &'static str,
}

impl BuildVariant {
    /// Every variant, in table order.
    pub const ALL: [BuildVariant; 7] = [
        BuildVariant::Release,
        BuildVariant::Debug,
        BuildVariant::Asan,
        BuildVariant::Msan,
        BuildVariant::Tsan,
        BuildVariant::Valgrind,
        BuildVariant::ValgrindDbg,
    ];

    /// Canonical name, as written in CI matrices.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Release => "Release",
            BuildVariant::Debug => "Debug",
            BuildVariant::Asan => "Asan",
            BuildVariant::Msan => "Msan",
            BuildVariant::Tsan => "Tsan",
            BuildVariant::Valgrind => "Valgrind",
            BuildVariant::ValgrindDbg => "ValgrindDbg",
        }
    }

    /// Lower-case snake_case name, used for directory naming.
    pub fn slug(&self) -> &'static str {
        match self {
            BuildVariant::Release => "release",
            BuildVariant::Debug => "debug",
            BuildVariant::Asan => "asan",
            BuildVariant::Msan => "msan",
            BuildVariant::Tsan => "tsan",
            BuildVariant::Valgrind => "valgrind",
            BuildVariant::ValgrindDbg => "valgrind_dbg",
        }
    }

    /// Look up the optimization mode and flags for this variant.
    pub fn profile(&self) -> VariantProfile {
        let (optimization, compiler_flags) = match self {
            BuildVariant::Release => (OptimizationMode::Release, "-O3"),
            BuildVariant::Debug => (OptimizationMode::Debug, "-ggdb3"),
            BuildVariant::Asan => (
                OptimizationMode::Release,
                "-O1 -g -fsanitize=address -fno-omit-frame-pointer",
            ),
            BuildVariant::Msan => (
                OptimizationMode::Release,
                "-fsanitize=memory -fno-omit-frame-pointer -g -O2",
            ),
            BuildVariant::Tsan => (OptimizationMode::Release, "-fsanitize=thread -g -O1"),
            BuildVariant::Valgrind => (OptimizationMode::Release, ""),
            BuildVariant::ValgrindDbg => (OptimizationMode::Debug, ""),
        };

        VariantProfile {
            optimization,
            compiler_flags,
        }
    }

    /// Whether the test binary must run under the memory-checking harness.
    pub fn needs_memcheck(&self) -> bool {
        matches!(self, BuildVariant::Valgrind | BuildVariant::ValgrindDbg)
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        BuildVariant::ALL
            .into_iter()
            .find(|v| v.slug() == key || v.as_str().eq_ignore_ascii_case(&key))
            .ok_or_else(|| DriverError::UnknownVariant {
                value: s.to_string(),
                expected: BuildVariant::ALL.iter().map(|v| v.as_str()).collect(),
            })
    }
}
