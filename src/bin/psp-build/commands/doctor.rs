//! `psp-build doctor` command

use anyhow::Result;

use super::Env;
use crate::cli::DoctorArgs;
use psp_build::builder::{BuildVariant, CompilerIdentity};
use psp_build::ops::psp_run::load_settings;
use psp_build::ops::{doctor, format_report, DoctorOptions};
use psp_build::util::Shell;

pub fn execute(args: DoctorArgs, env: &Env, shell: &Shell) -> Result<i32> {
    let settings = load_settings(&env.project_root, env.global_config.as_deref(), None)?;

    let options = DoctorOptions {
        compiler: args
            .compiler
            .as_deref()
            .map(str::parse::<CompilerIdentity>)
            .transpose()?,
        variant: args
            .variant
            .as_deref()
            .map(str::parse::<BuildVariant>)
            .transpose()?,
    };

    let report = doctor(&settings, &options);

    if shell.is_json() {
        for check in &report.checks {
            shell.json_event(&serde_json::json!({
                "reason": "check",
                "name": check.name,
                "passed": check.passed,
                "required": check.required,
                "message": check.message,
                "path": check.path,
                "version": check.version,
            }));
        }
    } else {
        // Print the formatted report
        print!("{}", format_report(&report, shell.is_verbose()));
    }

    // Exit with error code if required checks failed
    Ok(if report.all_required_passed() { 0 } else { 1 })
}
