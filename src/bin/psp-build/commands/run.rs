//! `psp-build run` command

use std::time::Duration;

use anyhow::Result;
use indicatif::ProgressBar;

use super::Env;
use crate::cli::RunArgs;
use psp_build::builder::driver::{Outcome, Stage};
use psp_build::builder::errors::DriverError;
use psp_build::builder::events::PipelineEvent;
use psp_build::ops::psp_run::{run, RunOptions};
use psp_build::util::diagnostic::{self, suggestions};
use psp_build::util::process::SPAWN_FAILURE_EXIT_CODE;
use psp_build::util::shell::{format_duration, Status};
use psp_build::util::Shell;

pub fn execute(args: RunArgs, env: &Env, shell: &Shell) -> Result<i32> {
    let opts = RunOptions {
        project_root: env.project_root.clone(),
        compiler: args.selectors.compiler,
        variant: args.selectors.variant,
        build_root: args.build_root,
        dry_run: args.dry_run,
        global_config: env.global_config.clone(),
    };

    let mut spinner: Option<ProgressBar> = None;
    let mut elapsed = Duration::ZERO;

    let report = run(&opts, |event| {
        if let PipelineEvent::PipelineFinished { duration_ms, .. } = event {
            elapsed = Duration::from_millis(*duration_ms);
        }
        render_event(shell, event, opts.dry_run, &mut spinner);
    })?;

    match &report.outcome {
        Outcome::TestRun(output) => {
            // The test's own output is the interesting part of a run
            if !shell.is_json() {
                print!("{}", output.stdout);
                shell.raw(&output.stderr);
            }
            if output.success() {
                shell.status(
                    Status::Finished,
                    format!(
                        "{} in {}",
                        report.build_dir.display(),
                        format_duration(elapsed)
                    ),
                );
            } else {
                shell.error(format!("test exited with code {}", output.code));
            }
        }
        Outcome::Skipped(_) => {
            shell.status(
                Status::Finished,
                format!("{} (skipped remaining stages)", report.build_dir.display()),
            );
        }
        Outcome::Failed(err) => report_failure(shell, err),
    }

    Ok(report.exit_code())
}

fn render_event(
    shell: &Shell,
    event: &PipelineEvent,
    dry_run: bool,
    spinner: &mut Option<ProgressBar>,
) {
    if shell.is_json() {
        shell.json_event(&event.to_json());
        return;
    }

    match event {
        PipelineEvent::StageStarted { stage, command, .. } => {
            let status = match stage {
                Stage::Generate => Status::Generating,
                Stage::Build => Status::Building,
                Stage::Test => Status::Running,
            };
            if dry_run {
                shell.status(status, format!("(dry run) {}", command));
            } else {
                shell.status(status, command);
                *spinner = shell.spinner(format!("{} step", stage));
            }
        }
        PipelineEvent::StageFinished {
            stage,
            exit_code,
            duration_ms,
        } => {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
            if shell.is_verbose() {
                shell.note(format!(
                    "{} step exited with {} after {}",
                    stage,
                    exit_code,
                    format_duration(Duration::from_millis(*duration_ms))
                ));
            }
        }
        PipelineEvent::PipelineSkipped { skip } => {
            shell.status(Status::Skipped, skip);
        }
        // The output itself is printed once the report is in, as a
        // diagnostic or as test output. A child that never started has no
        // `StageFinished`, so the spinner is cleared here too.
        PipelineEvent::StageOutput { .. } => {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
        }
        PipelineEvent::PipelineFinished { .. } => {}
    }
}

/// Show a failing stage's command and captured output.
fn report_failure(shell: &Shell, err: &DriverError) {
    if shell.is_json() {
        shell.error(err);
        return;
    }

    let suggestion = match err {
        DriverError::StageFailed { code, .. } if *code == SPAWN_FAILURE_EXIT_CODE => {
            suggestions::TOOL_MISSING
        }
        _ => suggestions::STAGE_FAILED,
    };
    diagnostic::emit(
        &err.to_diagnostic().with_suggestion(suggestion),
        shell.use_color(),
    );
}
