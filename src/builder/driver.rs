//! Execution driver - the fail-fast build pipeline.
//!
//! The pipeline is a linear state machine:
//!
//! ```text
//! Created -> DirectoryReady -> Generated -> Built -> TestSelected -> TestRun
//!                 |                            |
//!                 +-> Skipped (unsupported)    +-> Skipped (cross-compiled)
//! ```
//!
//! Any stage failing moves straight to `Failed`. Every stage launches one
//! child process and blocks until it exits; nothing is retried and nothing
//! is rolled back, so the build directory stays around for inspection.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;

use crate::builder::cmake::CMakeInvocation;
use crate::builder::context::{BuildContext, SkipReason};
use crate::builder::errors::DriverError;
use crate::builder::events::PipelineEvent;
use crate::util::fs::ensure_dir;
use crate::util::process::{ProcessBuilder, StageOutput, SPAWN_FAILURE_EXIT_CODE};

/// A step of the pipeline that launches a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Generator invocation
    Generate,
    /// Build tool invocation
    Build,
    /// Test binary invocation
    Test,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Generate => "generate",
            Stage::Build => "build",
            Stage::Test => "test",
        })
    }
}

/// States of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    Created,
    DirectoryReady,
    Generated,
    Built,
    TestSelected,
    TestRun,
    Skipped,
    Failed,
}

impl PipelineState {
    /// Whether no further transition can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::TestRun | PipelineState::Skipped | PipelineState::Failed
        )
    }
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The test stage ran; its own exit code is passed through.
    TestRun(StageOutput),
    /// The pipeline stopped early with success.
    Skipped(SkipReason),
    /// A stage before the test failed.
    Failed(DriverError),
}

/// Everything a pipeline run did, in order.
#[derive(Debug)]
pub struct PipelineReport {
    /// States visited, starting at `Created`
    pub history: Vec<PipelineState>,
    /// Commands issued (or, in a dry run, that would have been issued)
    pub commands: Vec<(Stage, String)>,
    /// Terminal outcome
    pub outcome: Outcome,
    /// Build directory the run used
    pub build_dir: PathBuf,
}

impl PipelineReport {
    /// Final state of the state machine.
    pub fn state(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Created)
    }

    /// Exit code the driver process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            Outcome::TestRun(output) => output.code,
            Outcome::Skipped(_) => 0,
            Outcome::Failed(err) => err.exit_code(),
        }
    }

    /// Whether the run counts as successful.
    pub fn success(&self) -> bool {
        self.exit_code() == 0
    }

    /// Commands issued for a given stage.
    pub fn commands_for(&self, stage: Stage) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(move |(s, _)| *s == stage)
            .map(|(_, c)| c.as_str())
    }

    /// Whether a stage's command was issued at all.
    pub fn ran(&self, stage: Stage) -> bool {
        self.commands_for(stage).next().is_some()
    }
}

/// Runs stage commands.
///
/// Implementations block until the child exits and return its captured
/// output. An `Err` means the process could not be started.
pub trait StageExecutor {
    fn execute(&self, cmd: &ProcessBuilder) -> Result<StageOutput>;
}

/// Executor that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl StageExecutor for SystemExecutor {
    fn execute(&self, cmd: &ProcessBuilder) -> Result<StageOutput> {
        Ok(cmd.exec()?.into())
    }
}

/// Callback receiving pipeline events as they happen.
pub type EventSink<'a> = Box<dyn FnMut(&PipelineEvent) + 'a>;

/// The execution driver.
pub struct Driver<'a, E: StageExecutor> {
    executor: E,
    dry_run: bool,
    sink: Option<EventSink<'a>>,
}

/// Bookkeeping for a single run.
struct Run {
    history: Vec<PipelineState>,
    commands: Vec<(Stage, String)>,
    started: Instant,
}

impl Run {
    fn transition(&mut self, state: PipelineState) {
        tracing::debug!(?state, "pipeline transition");
        self.history.push(state);
    }
}

impl<'a, E: StageExecutor> Driver<'a, E> {
    /// Create a driver that launches stages through `executor`.
    pub fn new(executor: E) -> Self {
        Driver {
            executor,
            dry_run: false,
            sink: None,
        }
    }

    /// Walk the pipeline without creating directories or spawning processes.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Receive events as stages start and finish.
    pub fn on_event(mut self, sink: impl FnMut(&PipelineEvent) + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Get the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn emit(&mut self, event: PipelineEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&event);
        }
    }

    /// Run the pipeline for a resolved context.
    pub fn run(&mut self, ctx: &BuildContext) -> PipelineReport {
        let mut run = Run {
            history: vec![PipelineState::Created],
            commands: Vec::new(),
            started: Instant::now(),
        };

        let outcome = self.drive(ctx, &mut run);
        let report = PipelineReport {
            history: run.history,
            commands: run.commands,
            outcome,
            build_dir: ctx.build_dir.clone(),
        };

        tracing::info!(
            state = ?report.state(),
            exit_code = report.exit_code(),
            "pipeline finished"
        );
        self.emit(PipelineEvent::PipelineFinished {
            state: report.state(),
            success: report.success(),
            exit_code: report.exit_code(),
            duration_ms: run.started.elapsed().as_millis() as u64,
        });

        report
    }

    fn drive(&mut self, ctx: &BuildContext, run: &mut Run) -> Outcome {
        // 1. Build directory
        if !self.dry_run {
            if let Err(err) = ensure_dir(&ctx.build_dir) {
                run.transition(PipelineState::Failed);
                return Outcome::Failed(err);
            }
        }
        run.transition(PipelineState::DirectoryReady);

        if let Some(skip) = ctx.skip {
            return self.skip(run, skip);
        }

        let cmake = CMakeInvocation::new(ctx);

        // 2. Generator
        if let Err(err) = self.checked_stage(run, Stage::Generate, &cmake.configure_command()) {
            run.transition(PipelineState::Failed);
            return Outcome::Failed(err);
        }
        run.transition(PipelineState::Generated);

        // 3. Build tool
        if let Err(err) = self.checked_stage(run, Stage::Build, &cmake.build_command()) {
            run.transition(PipelineState::Failed);
            return Outcome::Failed(err);
        }
        run.transition(PipelineState::Built);

        // 4. Cross-compiled output has nothing to execute
        if !ctx.compiler.is_native() {
            return self.skip(run, SkipReason::CrossCompiled);
        }

        // 5. Test binary
        let test = ctx.test_command();
        run.transition(PipelineState::TestSelected);

        match self.stage(run, Stage::Test, &test) {
            Ok(output) => {
                if !self.dry_run {
                    self.emit_output(Stage::Test, &test, &output);
                }
                run.transition(PipelineState::TestRun);
                Outcome::TestRun(output)
            }
            Err(err) => {
                run.transition(PipelineState::Failed);
                Outcome::Failed(err)
            }
        }
    }

    fn skip(&mut self, run: &mut Run, skip: SkipReason) -> Outcome {
        tracing::info!(%skip, "skipping remaining stages");
        run.transition(PipelineState::Skipped);
        self.emit(PipelineEvent::PipelineSkipped { skip });
        Outcome::Skipped(skip)
    }

    /// Run a stage and require a zero exit code.
    fn checked_stage(
        &mut self,
        run: &mut Run,
        stage: Stage,
        cmd: &ProcessBuilder,
    ) -> Result<StageOutput, DriverError> {
        let output = self.stage(run, stage, cmd)?;
        if output.success() {
            Ok(output)
        } else {
            self.emit_output(stage, cmd, &output);
            Err(stage_failure(stage, cmd, output))
        }
    }

    fn emit_output(&mut self, stage: Stage, cmd: &ProcessBuilder, output: &StageOutput) {
        self.emit(PipelineEvent::StageOutput {
            stage,
            command: cmd.display_command(),
            exit_code: output.code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        });
    }

    /// Run a stage, returning its output whatever the exit code.
    ///
    /// Only a failure to launch the process is an error here.
    fn stage(
        &mut self,
        run: &mut Run,
        stage: Stage,
        cmd: &ProcessBuilder,
    ) -> Result<StageOutput, DriverError> {
        let command = cmd.display_command();
        tracing::info!(%stage, "running `{}`", command);

        run.commands.push((stage, command.clone()));
        self.emit(PipelineEvent::StageStarted {
            stage,
            command,
            cwd: cmd.get_cwd().map(|p| p.to_path_buf()),
        });

        let start = Instant::now();
        let output = if self.dry_run {
            StageOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }
        } else {
            match self.executor.execute(cmd) {
                Ok(output) => output,
                Err(e) => {
                    tracing::debug!("failed to launch {}: {:#}", stage, e);
                    let output = StageOutput {
                        code: SPAWN_FAILURE_EXIT_CODE,
                        stdout: String::new(),
                        stderr: format!("{:#}", e),
                    };
                    self.emit_output(stage, cmd, &output);
                    return Err(stage_failure(stage, cmd, output));
                }
            }
        };

        self.emit(PipelineEvent::StageFinished {
            stage,
            exit_code: output.code,
            duration_ms: start.elapsed().as_millis() as u64,
        });

        Ok(output)
    }
}

fn stage_failure(stage: Stage, cmd: &ProcessBuilder, output: StageOutput) -> DriverError {
    DriverError::StageFailed {
        stage,
        command: cmd.display_command(),
        code: output.code,
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
