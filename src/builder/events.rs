//! Pipeline event types for JSON output.
//!
//! This module defines the JSON schema for machine-readable driver output.
//! These events are emitted when using `--message-format=json`.
//!
//! # Event Types
//!
//! - `stage-started`: A child process is about to be launched
//! - `stage-finished`: A child process exited
//! - `stage-output`: Captured output of a failing stage or of the test stage
//! - `pipeline-skipped`: The pipeline stopped early with success
//! - `pipeline-finished`: The pipeline reached a terminal state

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::context::SkipReason;
use crate::builder::driver::{PipelineState, Stage};

/// An event emitted while the pipeline runs.
///
/// Each event is serialized as a single JSON object per line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum PipelineEvent {
    /// A stage is about to run.
    #[serde(rename = "stage-started")]
    StageStarted {
        stage: Stage,
        /// Command line, as it would be typed in a shell
        command: String,
        /// Working directory
        cwd: Option<PathBuf>,
    },

    /// A stage exited.
    #[serde(rename = "stage-finished")]
    StageFinished {
        stage: Stage,
        /// Exit code of the child process
        exit_code: i32,
        /// Wall time in milliseconds
        duration_ms: u64,
    },

    /// Captured output of a stage that failed, or of the test stage.
    #[serde(rename = "stage-output")]
    StageOutput {
        stage: Stage,
        /// Command line that produced the output
        command: String,
        /// Exit code of the child process
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The pipeline stopped early without running every stage.
    #[serde(rename = "pipeline-skipped")]
    PipelineSkipped { skip: SkipReason },

    /// The pipeline reached a terminal state.
    #[serde(rename = "pipeline-finished")]
    PipelineFinished {
        state: PipelineState,
        success: bool,
        exit_code: i32,
        /// Total duration in milliseconds
        duration_ms: u64,
    },
}

impl PipelineEvent {
    /// Serialize this event to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
