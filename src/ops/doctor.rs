//! Environment and toolchain health checks.
//!
//! The `doctor` command verifies that every program the pipeline would launch
//! is on PATH before a CI job spends time on a build.
//!
//! ## Usage
//!
//! ```bash
//! psp-build doctor                          # Every toolchain, all optional
//! psp-build doctor --compiler gcc           # gcc/g++ become required
//! psp-build doctor --variant Valgrind       # valgrind becomes required
//! ```
//!
//! ## Checks Performed
//!
//! - Generator (cmake) and build tool (ninja)
//! - C and C++ drivers for each compiler identity
//! - Memory-checking harness (valgrind)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::builder::toolchain::CompilerIdentity;
use crate::builder::variant::BuildVariant;
use crate::util::config::{
    DriverSettings, DEFAULT_BUILD_TOOL, DEFAULT_GENERATOR_PROGRAM, DEFAULT_HARNESS,
};
use crate::util::process::{find_executable, ProcessBuilder};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set whether this check is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the tool path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        DoctorReport::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Compiler the job will use; its drivers become required
    pub compiler: Option<CompilerIdentity>,

    /// Variant the job will use; memory-checking variants require the harness
    pub variant: Option<BuildVariant>,
}

/// Run the doctor checks against the resolved settings.
pub fn doctor(settings: &DriverSettings, options: &DoctorOptions) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    // Collect environment info
    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report.environment.insert(
        "build_root".to_string(),
        settings.build_root.display().to_string(),
    );

    // Generator and build tool are needed by every pipeline
    report.add(check_tool(
        "Generator",
        &settings.generator_program,
        is_default(&settings.generator_program, DEFAULT_GENERATOR_PROGRAM),
    ));
    report.add(check_tool(
        "Build Tool",
        &settings.build_tool,
        is_default(&settings.build_tool, DEFAULT_BUILD_TOOL),
    ));

    // Compilers
    let compilers: Vec<CompilerIdentity> = match options.compiler {
        Some(compiler) => vec![compiler],
        None => CompilerIdentity::ALL.to_vec(),
    };
    for compiler in compilers {
        let required = options.compiler.is_some();
        let profile = compiler.profile();
        report.add(
            check_tool(format!("{} C compiler", compiler), Path::new(profile.cc), true)
                .required(required),
        );
        report.add(
            check_tool(format!("{} C++ compiler", compiler), Path::new(profile.cxx), true)
                .required(required),
        );
    }

    // Memory-checking harness
    let harness_required = options.variant.is_some_and(|v| v.needs_memcheck());
    report.add(
        check_tool(
            "Memcheck Harness",
            &settings.harness,
            is_default(&settings.harness, DEFAULT_HARNESS),
        )
        .required(harness_required),
    );

    report.total_duration = start.elapsed();
    report
}

/// Whether a configured program is still the built-in default.
fn is_default(program: &Path, default: &str) -> bool {
    program == Path::new(default)
}

/// Check that a program is on PATH and, if `read_version`, ask it for its version.
///
/// Callers pass `false` for programs the user configured, which are located
/// but never run.
fn check_tool(name: impl Into<String>, program: &Path, read_version: bool) -> CheckResult {
    let start = Instant::now();
    let name = name.into();

    let Some(path) = find_executable(program) else {
        return CheckResult::fail(&name, format!("`{}` not found", program.display()))
            .with_duration(start.elapsed());
    };

    let mut check = CheckResult::pass(&name, format!("Found {}", program.display()))
        .with_path(path.clone());
    if read_version {
        if let Some(version) = tool_version(&path) {
            check = check.with_version(version);
        }
    }
    check.with_duration(start.elapsed())
}

/// First non-empty line of `<program> --version`.
fn tool_version(program: &Path) -> Option<String> {
    let output = ProcessBuilder::new(program).arg("--version").exec().ok()?;

    // Some tools print their version to stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "psp-build doctor");
    let _ = writeln!(output, "================\n");

    // Environment
    if verbose {
        let unknown = "unknown".to_string();
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(
            output,
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        );
        if let Some(root) = report.environment.get("build_root") {
            let _ = writeln!(output, "  Build root: {}", root);
        }
        let _ = writeln!(output);
    }

    // Checks
    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose {
            let _ = writeln!(output, "      {}", check.message);
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(output);

    // Summary
    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. The pipeline will not run.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed.");
    }

    output
}
