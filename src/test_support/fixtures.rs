//! Test fixtures for common test scenarios.

use std::fs;

use tempfile::TempDir;

use crate::util::config::PROJECT_CONFIG_FILE;

/// Minimal project description handed to the generator.
pub const MINIMAL_CMAKELISTS: &str = "cmake_minimum_required(VERSION 3.10)\nproject(psp CXX)\n";

/// Create a temporary project root with a CMakeLists.txt and, optionally,
/// a `psp-build.toml`.
pub fn create_test_project(config: Option<&str>) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("CMakeLists.txt"), MINIMAL_CMAKELISTS).unwrap();

    if let Some(config) = config {
        fs::write(tmp.path().join(PROJECT_CONFIG_FILE), config).unwrap();
    }

    tmp
}
