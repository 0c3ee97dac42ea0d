//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use psp_build::util::shell::ColorChoice;

/// psp-build - resolve and drive CMake builds for every compiler and variant
#[derive(Parser)]
#[command(name = "psp-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_parser = parse_color)]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Project root holding CMakeLists.txt and psp-build.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_color(s: &str) -> Result<ColorChoice, String> {
    s.parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Status lines for people
    Human,
    /// One JSON object per line on stdout
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the selectors and run generate, build and test
    Run(RunArgs),

    /// Print the resolved configuration and commands without running them
    Resolve(ResolveArgs),

    /// List every compiler and variant pair
    Matrix,

    /// Check that the required tools are installed
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Compiler and variant selectors, read from the environment by default.
#[derive(Args)]
pub struct SelectorArgs {
    /// Compiler identity (clang, gcc, emscripten)
    #[arg(long, env = "Compiler")]
    pub compiler: Option<String>,

    /// Build variant (Release, Debug, Asan, Msan, Tsan, Valgrind, ValgrindDbg)
    #[arg(long, env = "BuildType")]
    pub variant: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub selectors: SelectorArgs,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Parent directory of the per-pair build directories
    #[arg(long, value_name = "PATH")]
    pub build_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub selectors: SelectorArgs,

    /// Parent directory of the per-pair build directories
    #[arg(long, value_name = "PATH")]
    pub build_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Treat this compiler's drivers as required
    #[arg(long, env = "Compiler")]
    pub compiler: Option<String>,

    /// Treat the harness as required if this variant needs it
    #[arg(long, env = "BuildType")]
    pub variant: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
