//! psp-build CLI - build configuration resolver and driver

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use psp_build::builder::errors::DriverError;
use psp_build::util::config::global_config_path;
use psp_build::util::diagnostic::{self, Diagnostic};
use psp_build::util::fs::absolute_path;
use psp_build::util::Shell;

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    // Set up logging; RUST_LOG wins over the verbosity flags
    let default_filter = if cli.verbose {
        "psp_build=debug"
    } else if cli.quiet {
        "psp_build=warn"
    } else {
        "psp_build=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(shell.use_color())
        .with_target(false)
        .without_time()
        .init();

    let code = match run(cli, &shell) {
        Ok(code) => code,
        Err(e) => report_error(&shell, &e),
    };

    std::process::exit(code);
}

fn run(cli: Cli, shell: &Shell) -> Result<i32> {
    let project_root = match cli.manifest_dir {
        Some(dir) => absolute_path(&dir),
        None => std::env::current_dir()?,
    };

    let global_config = global_config_path();
    if global_config.is_none() {
        tracing::warn!("could not determine home directory; skipping global config");
    }

    let env = commands::Env {
        project_root,
        global_config,
    };

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &env, shell),
        Commands::Resolve(args) => commands::resolve::execute(args, &env, shell),
        Commands::Matrix => commands::matrix::execute(&env, shell),
        Commands::Doctor(args) => commands::doctor::execute(args, &env, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Render an error that escaped a command and pick the exit code.
fn report_error(shell: &Shell, err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DriverError>() {
        Some(driver_err) => {
            if shell.is_json() {
                shell.error(driver_err);
            } else {
                diagnostic::emit(&driver_err.to_diagnostic(), shell.use_color());
            }
            driver_err.exit_code()
        }
        None => {
            if shell.is_json() {
                shell.error(format!("{:#}", err));
            } else {
                diagnostic::emit(&Diagnostic::error(format!("{:#}", err)), shell.use_color());
            }
            1
        }
    }
}
