//! High-level operations.
//!
//! This module contains the implementation of psp-build commands.

pub mod doctor;
pub mod plan;
pub mod psp_run;

pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use plan::{matrix, BuildPlan, MatrixEntry};
pub use psp_run::{load_settings, resolve_context, run, run_with, RunOptions};
