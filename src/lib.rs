//! psp-build - build configuration resolver and driver for the psp C++ project
//!
//! This crate maps a compiler identity and a build variant onto concrete
//! CMake and Ninja invocations, then drives the generate, build, and test
//! stages as a fail-fast pipeline.

pub mod builder;
pub mod ops;
pub mod util;

/// Test utilities and mocks for psp-build unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a mock stage executor and temporary project fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    BuildContext, BuildVariant, CompilerIdentity, Driver, DriverError, PipelineReport, Stage,
};
pub use util::config::{Config, DriverSettings};
