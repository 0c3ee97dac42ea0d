//! Test invocation selection.
//!
//! The binary under test is always the same artifact; memory-checking
//! variants only change how it is launched.

use std::path::Path;

use crate::builder::variant::BuildVariant;
use crate::util::process::ProcessBuilder;

/// Options passed to the memory-checking harness.
pub const MEMCHECK_ARGS: [&str; 3] = ["--leak-check=full", "--verbose", "--track-origins=yes"];

/// Choose the command that runs `binary` for the given variant.
///
/// Memory-checking variants run the binary under `harness` with full leak
/// checking, verbose reporting and origin tracking; every other variant runs
/// it directly.
pub fn select_test_command(variant: BuildVariant, binary: &Path, harness: &Path) -> ProcessBuilder {
    if variant.needs_memcheck() {
        ProcessBuilder::new(harness).args(MEMCHECK_ARGS).arg(binary)
    } else {
        ProcessBuilder::new(binary)
    }
}
