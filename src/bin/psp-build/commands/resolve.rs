//! `psp-build resolve` command
//!
//! Shows exactly what `run` would do for the current selectors.

use anyhow::Result;

use super::Env;
use crate::cli::ResolveArgs;
use psp_build::ops::plan::BuildPlan;
use psp_build::ops::psp_run::{resolve_context, RunOptions};
use psp_build::util::Shell;

pub fn execute(args: ResolveArgs, env: &Env, shell: &Shell) -> Result<i32> {
    let opts = RunOptions {
        project_root: env.project_root.clone(),
        compiler: args.selectors.compiler,
        variant: args.selectors.variant,
        build_root: args.build_root,
        dry_run: true,
        global_config: env.global_config.clone(),
    };

    let ctx = resolve_context(&opts)?;
    let plan = BuildPlan::new(&ctx);

    if shell.is_json() {
        shell.json_event(&serde_json::to_value(&plan)?);
        return Ok(0);
    }

    let definitions = if plan.definitions.is_empty() {
        "(none)".to_string()
    } else {
        plan.definitions.join(" ")
    };
    let flags = if plan.compiler_flags.is_empty() {
        "(none)"
    } else {
        plan.compiler_flags
    };

    println!("compiler:    {} ({} / {})", plan.compiler.as_str(), plan.cc, plan.cxx);
    println!("variant:     {} ({})", plan.variant, plan.build_type);
    println!("flags:       {}", flags);
    println!("definitions: {}", definitions);
    println!("build dir:   {}", plan.build_dir.display());
    if let Some(skip) = &plan.skip {
        println!("skip:        {}", skip);
    }
    println!();

    let stages = [
        ("generate", &plan.generate),
        ("build", &plan.build),
        ("test", &plan.test),
    ];
    for (name, command) in stages {
        match command {
            Some(command) => println!("{:<9} {}", format!("{}:", name), command),
            None => println!("{:<9} (not run)", format!("{}:", name)),
        }
    }

    Ok(0)
}
