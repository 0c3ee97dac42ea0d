//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::errors::{DriverError, DriverResult};

/// Ensure a directory exists, creating it and its parents if necessary.
///
/// An existing directory is not an error. Returns the canonical path of the
/// directory so repeated calls for the same path agree on its identity.
pub fn ensure_dir(path: &Path) -> DriverResult<PathBuf> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(normalize_path(path))
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Make a path absolute against the current directory.
///
/// Unlike [`normalize_path`] this never touches the filesystem, so it works
/// for directories that have not been created yet. The path is returned
/// unchanged if the current directory cannot be read.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
