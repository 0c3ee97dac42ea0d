//! Driver error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::driver::Stage;
use crate::util::diagnostic::Diagnostic;

/// Exit code for configuration and environment errors.
///
/// Distinct from 1 so CI can tell a misconfigured job from a stage that
/// itself exited 1.
pub const CONFIG_EXIT_CODE: i32 = 2;

/// Error raised while resolving or driving a build.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DriverError {
    #[error("unknown compiler `{value}` (expected one of: {})", .expected.join(", "))]
    #[diagnostic(code(psp_build::config::unknown_compiler))]
    UnknownCompiler {
        value: String,
        expected: Vec<&'static str>,
    },

    #[error("unknown build variant `{value}` (expected one of: {})", .expected.join(", "))]
    #[diagnostic(code(psp_build::config::unknown_variant))]
    UnknownVariant {
        value: String,
        expected: Vec<&'static str>,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(psp_build::config::invalid))]
    InvalidConfig { path: PathBuf, message: String },

    #[error("required selector `{name}` is not set")]
    #[diagnostic(
        code(psp_build::env::missing_selector),
        help("export `{name}` or pass it on the command line")
    )]
    MissingSelector {
        name: &'static str,
        flag: &'static str,
    },

    #[error("{stage} step failed with exit code {code}")]
    #[diagnostic(code(psp_build::stage::failed))]
    StageFailed {
        stage: Stage,
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("I/O error at {}", .path.display())]
    #[diagnostic(code(psp_build::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriverError {
    /// Process exit code the driver should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::StageFailed { code, .. } => *code,
            DriverError::UnknownCompiler { .. }
            | DriverError::UnknownVariant { .. }
            | DriverError::InvalidConfig { .. }
            | DriverError::MissingSelector { .. } => CONFIG_EXIT_CODE,
            DriverError::Io { .. } => 1,
        }
    }

    /// Whether this error was raised before any external process ran.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DriverError::UnknownCompiler { .. }
                | DriverError::UnknownVariant { .. }
                | DriverError::InvalidConfig { .. }
                | DriverError::MissingSelector { .. }
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DriverError::UnknownCompiler { value, expected } => {
                Diagnostic::error(format!("unknown compiler `{}`", value))
                    .with_context(format!("supported compilers: {}", expected.join(", ")))
                    .with_suggestion("Set `Compiler` to one of the supported compilers")
            }

            DriverError::UnknownVariant { value, expected } => {
                Diagnostic::error(format!("unknown build variant `{}`", value))
                    .with_context(format!("supported variants: {}", expected.join(", ")))
                    .with_suggestion("Set `BuildType` to one of the supported variants")
            }

            DriverError::InvalidConfig { path, message } => {
                Diagnostic::error("invalid configuration file")
                    .with_location(path)
                    .with_context(message.clone())
            }

            DriverError::MissingSelector { name, flag } => {
                Diagnostic::error(format!("required selector `{}` is not set", name))
                    .with_suggestion(format!("Export `{}` in the job environment", name))
                    .with_suggestion(format!("Pass `{}` on the command line", flag))
            }

            DriverError::StageFailed {
                stage,
                command,
                code,
                stdout,
                stderr,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "{} step failed with exit code {}",
                    stage, code
                ))
                .with_context(format!("command: {}", command));

                if !stdout.trim().is_empty() {
                    diag = diag.with_context(format!("stdout:\n{}", stdout.trim_end()));
                }
                if !stderr.trim().is_empty() {
                    diag = diag.with_context(format!("stderr:\n{}", stderr.trim_end()));
                }

                diag
            }

            DriverError::Io { path, source } => {
                Diagnostic::error(source.to_string()).with_location(path)
            }
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
