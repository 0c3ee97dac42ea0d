//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod process;
pub mod shell;

pub use config::{Config, DriverSettings};
pub use diagnostic::Diagnostic;
pub use process::ProcessBuilder;
pub use shell::Shell;
