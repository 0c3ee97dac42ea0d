//! Build resolution and execution.
//!
//! This module maps a compiler identity and build variant onto concrete
//! CMake/Ninja invocations and drives them as a fail-fast pipeline.

pub mod cmake;
pub mod context;
pub mod driver;
pub mod errors;
pub mod events;
pub mod test_command;
pub mod toolchain;
pub mod variant;

pub use cmake::CMakeInvocation;
pub use context::{resolve, resolve_selectors, BuildContext, SkipReason};
pub use driver::{Driver, Outcome, PipelineReport, PipelineState, Stage, StageExecutor, SystemExecutor};
pub use errors::{DriverError, DriverResult};
pub use events::PipelineEvent;
pub use test_command::select_test_command;
pub use toolchain::{CompilerIdentity, ToolchainProfile};
pub use variant::{BuildVariant, OptimizationMode, VariantProfile};
