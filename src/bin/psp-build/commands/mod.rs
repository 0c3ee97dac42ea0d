//! Command implementations

use std::path::PathBuf;

pub mod completions;
pub mod doctor;
pub mod matrix;
pub mod resolve;
pub mod run;

/// Locations every command resolves its settings from.
pub struct Env {
    /// Project root (`--manifest-dir`, or the current directory)
    pub project_root: PathBuf,
    /// Global config file, if a home directory could be found
    pub global_config: Option<PathBuf>,
}
