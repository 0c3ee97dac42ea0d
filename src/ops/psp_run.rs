//! Implementation of `psp-build run`.

use std::path::{Path, PathBuf};

use crate::builder::context::{resolve_selectors, BuildContext};
use crate::builder::driver::{Driver, PipelineReport, StageExecutor, SystemExecutor};
use crate::builder::errors::DriverResult;
use crate::builder::events::PipelineEvent;
use crate::util::config::{load_config, DriverSettings};
use crate::util::fs::absolute_path;

/// Options for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory holding the source tree and `psp-build.toml`
    pub project_root: PathBuf,

    /// Raw compiler selector value
    pub compiler: Option<String>,

    /// Raw build variant selector value
    pub variant: Option<String>,

    /// Override for the build root
    pub build_root: Option<PathBuf>,

    /// Print the commands without running them
    pub dry_run: bool,

    /// Global config file, if one should be consulted
    pub global_config: Option<PathBuf>,
}

/// Load configuration and resolve it into driver settings.
pub fn load_settings(
    project_root: &Path,
    global_config: Option<&Path>,
    build_root: Option<&Path>,
) -> DriverResult<DriverSettings> {
    let config = load_config(global_config, project_root)?;
    let mut settings = config.settings(project_root);

    if let Some(root) = build_root {
        settings.build_root = absolute_path(&project_root.join(root));
    }

    tracing::debug!(
        build_root = %settings.build_root.display(),
        source_dir = %settings.source_dir.display(),
        "loaded settings"
    );

    Ok(settings)
}

/// Resolve the build context for a run without executing anything.
pub fn resolve_context(opts: &RunOptions) -> DriverResult<BuildContext> {
    let settings = load_settings(
        &opts.project_root,
        opts.global_config.as_deref(),
        opts.build_root.as_deref(),
    )?;

    resolve_selectors(opts.compiler.as_deref(), opts.variant.as_deref(), &settings)
}

/// Resolve and drive the pipeline with real child processes.
///
/// Configuration errors are returned before any directory is touched; once
/// the pipeline starts, its outcome is carried by the report.
pub fn run(
    opts: &RunOptions,
    on_event: impl FnMut(&PipelineEvent),
) -> DriverResult<PipelineReport> {
    run_with(opts, SystemExecutor, on_event)
}

/// Resolve and drive the pipeline through a custom executor.
pub fn run_with<E: StageExecutor>(
    opts: &RunOptions,
    executor: E,
    on_event: impl FnMut(&PipelineEvent),
) -> DriverResult<PipelineReport> {
    let ctx = resolve_context(opts)?;

    tracing::info!(
        compiler = %ctx.compiler,
        variant = %ctx.variant,
        dry_run = opts.dry_run,
        "starting pipeline"
    );

    let mut driver = Driver::new(executor)
        .dry_run(opts.dry_run)
        .on_event(on_event);
    Ok(driver.run(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::driver::{PipelineState, Stage};
    use crate::builder::errors::{DriverError, CONFIG_EXIT_CODE};
    use crate::test_support::fixtures::create_test_project;
    use crate::test_support::{MockExecutor, MockProcessOutput};

    fn options(root: &Path, compiler: Option<&str>, variant: Option<&str>) -> RunOptions {
        RunOptions {
            project_root: root.to_path_buf(),
            compiler: compiler.map(str::to_string),
            variant: variant.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_selector_touches_nothing() {
        let project = create_test_project(None);
        let opts = options(project.path(), Some("gcc"), None);

        let exec = MockExecutor::new();
        let err = run_with(&opts, exec, |_| {}).unwrap_err();

        assert!(matches!(
            err,
            DriverError::MissingSelector {
                name: "BuildType",
                ..
            }
        ));
        assert_eq!(err.exit_code(), CONFIG_EXIT_CODE);
        assert!(!project.path().join("build").exists());
    }

    #[test]
    fn test_unknown_variant_is_configuration_error() {
        let project = create_test_project(None);
        let opts = options(project.path(), Some("clang"), Some("Profile"));

        let err = resolve_context(&opts).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_selectors_are_case_insensitive() {
        let project = create_test_project(None);
        let opts = options(project.path(), Some("GCC"), Some("valgrind_dbg"));

        let ctx = resolve_context(&opts).unwrap();
        assert!(ctx.build_dir.ends_with("build/gcc-valgrind_dbg"));
    }

    #[test]
    fn test_project_config_moves_build_root() {
        let project = create_test_project(Some("[build]\nroot = \"out\"\n"));
        let opts = options(project.path(), Some("clang"), Some("Debug"));

        let ctx = resolve_context(&opts).unwrap();
        assert_eq!(ctx.build_dir, project.path().join("out").join("clang-debug"));
    }

    #[test]
    fn test_build_root_flag_overrides_config() {
        let project = create_test_project(Some("[build]\nroot = \"out\"\n"));
        let mut opts = options(project.path(), Some("clang"), Some("Debug"));
        opts.build_root = Some(PathBuf::from("ci-build"));

        let ctx = resolve_context(&opts).unwrap();
        assert_eq!(
            ctx.build_dir,
            project.path().join("ci-build").join("clang-debug")
        );
    }

    #[test]
    fn test_invalid_project_config() {
        let project = create_test_project(Some("[build]\nrooot = \"out\"\n"));
        let opts = options(project.path(), Some("gcc"), Some("Release"));

        let err = resolve_context(&opts).unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig { .. }));
    }

    #[test]
    fn test_run_with_mock_executor() {
        let project = create_test_project(None);
        let opts = options(project.path(), Some("gcc"), Some("Asan"));

        let mut exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));

        let mut started = Vec::new();
        let report = run_with(&opts, exec, |event| {
            if let PipelineEvent::StageStarted { stage, .. } = event {
                started.push(*stage);
            }
        })
        .unwrap();

        assert_eq!(report.state(), PipelineState::TestRun);
        assert_eq!(started, vec![Stage::Generate, Stage::Build, Stage::Test]);
        assert!(project.path().join("build").join("gcc-asan").is_dir());
    }
}
