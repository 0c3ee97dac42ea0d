//! Test utilities and mocks for psp-build unit tests.
//!
//! The driver launches every stage through [`StageExecutor`], so tests swap
//! in a [`MockExecutor`] that records the command lines it was asked to run
//! and answers them with canned output.
//!
//! # Example
//!
//! ```rust,ignore
//! use psp_build::test_support::{MockExecutor, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut exec = MockExecutor::new();
//!     exec.expect("ninja", MockProcessOutput::failure(1, "ninja: error"));
//!
//!     // Hand `exec` to a Driver...
//! }
//! ```

pub mod fixtures;

use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::driver::StageExecutor;
use crate::util::process::{ProcessBuilder, StageOutput};

pub use fixtures::*;

/// Output of a mock process execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<MockProcessOutput> for StageOutput {
    fn from(output: MockProcessOutput) -> Self {
        StageOutput {
            code: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor for testing command execution.
///
/// Commands are matched against expectations in the order they were added,
/// using the same command line that is shown to users. A command with no
/// matching expectation and no default fails to "launch".
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.state()
            .expectations
            .push((CommandPattern::Exact(cmd.to_string()), output));
        self
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.state()
            .expectations
            .push((CommandPattern::StartsWith(prefix.to_string()), output));
        self
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.state()
            .expectations
            .push((CommandPattern::Contains(substring.to_string()), output));
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.state().default_output = Some(output);
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

impl StageExecutor for MockExecutor {
    fn execute(&self, cmd: &ProcessBuilder) -> Result<StageOutput> {
        let full_cmd = cmd.display_command();
        let mut state = self.state();
        state.calls.push(full_cmd.clone());

        if let Some((_, output)) = state
            .expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&full_cmd))
        {
            return Ok(output.clone().into());
        }

        if let Some(ref default) = state.default_output {
            return Ok(default.clone().into());
        }

        bail!("unexpected command: {}", full_cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_matches_in_order() {
        let mut exec = MockExecutor::new();
        exec.expect("ninja", MockProcessOutput::failure(2, "stopped"));
        exec.expect_prefix("nin", MockProcessOutput::success("never"));

        let out = exec.execute(&ProcessBuilder::new("ninja")).unwrap();
        assert_eq!(out.code, 2);
        assert_eq!(out.stderr, "stopped");
        assert_eq!(exec.calls(), vec!["ninja"]);
    }

    #[test]
    fn test_mock_executor_default_and_unexpected() {
        let mut exec = MockExecutor::new();
        assert!(exec.execute(&ProcessBuilder::new("cmake")).is_err());

        exec.set_default(MockProcessOutput::success("ok"));
        let out = exec.execute(&ProcessBuilder::new("cmake").arg("..")).unwrap();
        assert!(out.success());
        assert_eq!(exec.calls(), vec!["cmake", "cmake .."]);
    }
}
