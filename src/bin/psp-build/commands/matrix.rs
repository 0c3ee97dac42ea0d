//! `psp-build matrix` command

use anyhow::Result;

use super::Env;
use psp_build::ops::plan::{matrix, MatrixEntry};
use psp_build::ops::psp_run::load_settings;
use psp_build::util::Shell;

pub fn execute(env: &Env, shell: &Shell) -> Result<i32> {
    let settings = load_settings(&env.project_root, env.global_config.as_deref(), None)?;
    let entries = matrix(&settings);

    if shell.is_json() {
        for entry in &entries {
            shell.json_event(&serde_json::to_value(entry)?);
        }
        return Ok(0);
    }

    println!("{:<12} {:<12} {:<12} BUILD DIR", "COMPILER", "VARIANT", "MODE");
    for entry in &entries {
        println!(
            "{:<12} {:<12} {:<12} {}",
            entry.compiler.as_str(),
            entry.variant.as_str(),
            mode(entry),
            entry.build_dir.display()
        );
    }

    Ok(0)
}

fn mode(entry: &MatrixEntry) -> &'static str {
    if !entry.supported {
        "unsupported"
    } else if entry.cross {
        "build-only"
    } else if entry.memcheck {
        "memcheck"
    } else {
        "native"
    }
}
