//! Compiler identities and the toolchain binaries they select.
//!
//! Each identity names a compiler family and maps to the C and C++ driver
//! binaries handed to CMake, plus any preprocessor definitions the project
//! needs for that family.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::builder::errors::DriverError;

/// A named toolchain selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerIdentity {
    /// Clang/LLVM
    Clang,
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Emscripten, targeting WebAssembly
    Emscripten,
}

/// Resolved toolchain parameters for a compiler identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainProfile {
    /// C compiler driver
    pub cc: &'static str,
    /// C++ compiler driver
    pub cxx: &'static str,
    /// Extra `-D` definitions passed to the generator
    pub definitions: &'static [&'static str],
}

impl CompilerIdentity {
    /// Every compiler identity, in table order.
    pub const ALL: [CompilerIdentity; 3] = [
        CompilerIdentity::Clang,
        CompilerIdentity::Gcc,
        CompilerIdentity::Emscripten,
    ];

    /// Get the identity name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerIdentity::Clang => "clang",
            CompilerIdentity::Gcc => "gcc",
            CompilerIdentity::Emscripten => "emscripten",
        }
    }

    /// Look up the compiler binaries and definitions for this identity.
    pub fn profile(&self) -> ToolchainProfile {
        match self {
            CompilerIdentity::Clang => ToolchainProfile {
                cc: "clang",
                cxx: "clang++",
                definitions: &[],
            },
            CompilerIdentity::Gcc => ToolchainProfile {
                cc: "gcc",
                cxx: "g++",
                definitions: &[],
            },
            CompilerIdentity::Emscripten => ToolchainProfile {
                cc: "emcc",
                cxx: "em++",
                definitions: &["-DPSP_WASM_BUILD"],
            },
        }
    }

    /// Whether this toolchain produces binaries that run on the build host.
    ///
    /// Emscripten emits WebAssembly, so there is nothing to execute natively
    /// once the build finishes.
    pub fn is_native(&self) -> bool {
        !matches!(self, CompilerIdentity::Emscripten)
    }
}

impl fmt::Display for CompilerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompilerIdentity {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clang" => Ok(CompilerIdentity::Clang),
            "gcc" => Ok(CompilerIdentity::Gcc),
            "emscripten" => Ok(CompilerIdentity::Emscripten),
            _ => Err(DriverError::UnknownCompiler {
                value: s.to_string(),
                expected: CompilerIdentity::ALL.iter().map(|c| c.as_str()).collect(),
            }),
        }
    }
}
