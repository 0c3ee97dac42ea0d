//! CLI integration tests for psp-build.
//!
//! These tests drive the real binary. None of them need cmake, ninja or a
//! compiler: they either stop before any stage runs, use `--dry-run`, or
//! point the stage programs at `true`/`false` through `psp-build.toml`.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the psp-build binary command, isolated from the caller's environment.
fn psp_build(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("psp-build").unwrap();
    cmd.current_dir(project)
        .env("HOME", project)
        .env_remove("Compiler")
        .env_remove("BuildType")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a temporary project, optionally with a `psp-build.toml`.
fn project(config: Option<&str>) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.10)\nproject(psp CXX)\n",
    )
    .unwrap();
    if let Some(config) = config {
        fs::write(tmp.path().join("psp-build.toml"), config).unwrap();
    }
    tmp
}

/// Config whose generator cannot be launched, so any stage that runs fails.
const MISSING_GENERATOR: &str = "[build]\ngenerator-program = \"psp-build-missing-cmake\"\n";

// ============================================================================
// psp-build resolve
// ============================================================================

#[test]
fn test_resolve_gcc_release_from_environment() {
    let tmp = project(None);

    psp_build(tmp.path())
        .arg("resolve")
        .env("Compiler", "gcc")
        .env("BuildType", "Release")
        .assert()
        .success()
        .stdout(predicate::str::contains("gcc-release"))
        .stdout(predicate::str::contains(
            "cmake -G Ninja -DCMAKE_BUILD_TYPE=Release -DCMAKE_CXX_FLAGS=-O3 -DCMAKE_C_COMPILER=gcc -DCMAKE_CXX_COMPILER=g++",
        ))
        .stdout(predicate::str::contains("definitions: (none)"));
}

#[test]
fn test_resolve_flags_override_environment() {
    let tmp = project(None);

    psp_build(tmp.path())
        .args(["resolve", "--compiler", "clang", "--variant", "asan"])
        .env("Compiler", "gcc")
        .env("BuildType", "Release")
        .assert()
        .success()
        .stdout(predicate::str::contains("clang-asan"))
        .stdout(predicate::str::contains("-fsanitize=address"));
}

#[test]
fn test_resolve_json() {
    let tmp = project(None);

    let output = psp_build(tmp.path())
        .args(["--message-format", "json", "resolve"])
        .env("Compiler", "emscripten")
        .env("BuildType", "Debug")
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["compiler"], "emscripten");
    assert_eq!(plan["build_type"], "Debug");
    assert_eq!(plan["definitions"][0], "-DPSP_WASM_BUILD");
    assert_eq!(plan["skip"]["kind"], "cross-compiled");
    assert!(plan["test"].is_null());
}

#[test]
fn test_resolve_valgrind_wraps_test() {
    let tmp = project(None);

    psp_build(tmp.path())
        .args(["resolve", "--compiler", "gcc", "--variant", "ValgrindDbg"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "valgrind --leak-check=full --verbose --track-origins=yes",
        ))
        .stdout(predicate::str::contains("gcc-valgrind_dbg/install/psp_test"));
}

// ============================================================================
// Selector and configuration errors
// ============================================================================

#[test]
fn test_missing_selector_exits_with_config_code() {
    let tmp = project(None);

    psp_build(tmp.path())
        .arg("run")
        .env("BuildType", "Release")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("`Compiler`"));

    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_unknown_compiler_exits_with_config_code() {
    let tmp = project(None);

    psp_build(tmp.path())
        .args(["run", "--compiler", "icc", "--variant", "Release"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown compiler `icc`"))
        .stderr(predicate::str::contains("clang, gcc, emscripten"));
}

#[test]
fn test_unknown_variant_exits_with_config_code() {
    let tmp = project(None);

    psp_build(tmp.path())
        .args(["resolve", "--compiler", "gcc", "--variant", "Profile"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown build variant `Profile`"));
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let tmp = project(Some("[build]\njobs = 4\n"));

    psp_build(tmp.path())
        .args(["resolve", "--compiler", "gcc", "--variant", "Release"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid configuration"));
}

// ============================================================================
// psp-build run
// ============================================================================

#[test]
fn test_run_dry_run_spawns_nothing() {
    let tmp = project(Some(MISSING_GENERATOR));

    psp_build(tmp.path())
        .args(["run", "--dry-run", "--compiler", "clang", "--variant", "Tsan"])
        .assert()
        .success()
        .stderr(predicate::str::contains("(dry run) psp-build-missing-cmake -G Ninja"))
        .stderr(predicate::str::contains("(dry run) ninja"))
        .stderr(predicate::str::contains("clang-tsan/install/psp_test"));

    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_run_unsupported_pair_skips_without_generator() {
    let tmp = project(Some(MISSING_GENERATOR));

    psp_build(tmp.path())
        .arg("run")
        .env("Compiler", "gcc")
        .env("BuildType", "Msan")
        .assert()
        .success()
        .stderr(predicate::str::contains("MemorySanitizer"));

    assert!(tmp.path().join("build").join("gcc-msan").is_dir());
}

#[test]
fn test_run_build_root_override() {
    let tmp = project(Some(MISSING_GENERATOR));

    psp_build(tmp.path())
        .args(["run", "--compiler", "gcc", "--variant", "msan", "--build-root", "ci"])
        .assert()
        .success();

    assert!(tmp.path().join("ci").join("gcc-msan").is_dir());
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_run_missing_generator_reports_spawn_failure() {
    let tmp = project(Some(MISSING_GENERATOR));

    psp_build(tmp.path())
        .args(["run", "--compiler", "gcc", "--variant", "Release"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains("generate step failed with exit code 127"))
        .stderr(predicate::str::contains("psp-build doctor"));

    // The directory stays for inspection
    assert!(tmp.path().join("build").join("gcc-release").is_dir());
}

#[test]
fn test_run_json_events() {
    let tmp = project(None);

    let output = psp_build(tmp.path())
        .args(["--message-format", "json", "run", "--dry-run"])
        .env("Compiler", "emscripten")
        .env("BuildType", "Release")
        .output()
        .unwrap();
    assert!(output.status.success());

    let reasons: Vec<String> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).unwrap();
            event["reason"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        reasons,
        [
            "stage-started",
            "stage-finished",
            "stage-started",
            "stage-finished",
            "pipeline-skipped",
            "pipeline-finished",
        ]
    );
}

#[cfg(unix)]
fn stub_config(build_tool: &str, test_binary: &str) -> String {
    let resolve = |name: &str| which::which(name).unwrap().display().to_string();
    format!(
        "[build]\ngenerator-program = \"{}\"\nbuild-tool = \"{}\"\n\n[test]\nbinary = \"{}\"\n",
        resolve("true"),
        resolve(build_tool),
        resolve(test_binary),
    )
}

#[cfg(unix)]
#[test]
fn test_run_full_pipeline_with_stub_tools() {
    let tmp = project(Some(&stub_config("true", "true")));

    psp_build(tmp.path())
        .args(["run", "--compiler", "clang", "--variant", "Debug"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"));
}

#[cfg(unix)]
#[test]
fn test_run_build_failure_stops_pipeline() {
    let tmp = project(Some(&stub_config("false", "true")));

    psp_build(tmp.path())
        .args(["run", "--compiler", "gcc", "--variant", "Debug"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("build step failed with exit code 1"))
        .stderr(predicate::str::contains("Running").not());
}

#[cfg(unix)]
#[test]
fn test_run_test_exit_code_passes_through() {
    let tmp = project(Some(&stub_config("true", "false")));

    psp_build(tmp.path())
        .args(["run", "--compiler", "gcc", "--variant", "Release"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("test exited with code 1"));
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_run_relative_manifest_dir_and_build_root() {
    let workspace = TempDir::new().unwrap();
    let true_path = which::which("true").unwrap();
    let config = format!(
        "[build]\ngenerator-program = \"{0}\"\nbuild-tool = \"{0}\"\n",
        true_path.display()
    );
    let proj = workspace.path().join("proj");
    fs::create_dir(&proj).unwrap();
    fs::write(proj.join("psp-build.toml"), config).unwrap();

    // The default test binary is looked up from inside the build directory
    write_script(
        &proj.join("ci").join("gcc-release").join("install").join("psp_test"),
        "echo relative-paths-ok\n",
    );

    psp_build(workspace.path())
        .args(["--manifest-dir", "proj", "run"])
        .args(["--compiler", "gcc", "--variant", "Release", "--build-root", "ci"])
        .assert()
        .success()
        .stdout(predicate::str::contains("relative-paths-ok"));

    assert!(!workspace.path().join("ci").exists());
}

#[cfg(unix)]
#[test]
fn test_run_json_reports_failing_stage_output() {
    let tmp = project(None);
    let build_tool = tmp.path().join("failing-build");
    write_script(
        &build_tool,
        "echo BUILD-DIAG-OUT\necho BUILD-DIAG-ERR >&2\nexit 3\n",
    );
    let config = format!(
        "[build]\ngenerator-program = \"{}\"\nbuild-tool = \"{}\"\n",
        which::which("true").unwrap().display(),
        build_tool.display()
    );
    fs::write(tmp.path().join("psp-build.toml"), config).unwrap();

    let output = psp_build(tmp.path())
        .args(["--message-format", "json", "run"])
        .args(["--compiler", "clang", "--variant", "Debug"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    let reported: Vec<_> = events
        .iter()
        .filter(|e| e["reason"] == "stage-output")
        .collect();

    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0]["stage"], "build");
    assert_eq!(reported[0]["exit_code"], 3);
    assert!(reported[0]["command"]
        .as_str()
        .unwrap()
        .ends_with("failing-build"));
    assert!(reported[0]["stdout"]
        .as_str()
        .unwrap()
        .contains("BUILD-DIAG-OUT"));
    assert!(reported[0]["stderr"]
        .as_str()
        .unwrap()
        .contains("BUILD-DIAG-ERR"));
}

#[cfg(unix)]
#[test]
fn test_run_json_reports_test_output() {
    let tmp = project(None);
    let test_binary = tmp.path().join("fake-psp-test");
    write_script(&test_binary, "echo 12 tests passed\n");
    let config = format!(
        "[build]\ngenerator-program = \"{0}\"\nbuild-tool = \"{0}\"\n\n[test]\nbinary = \"{1}\"\n",
        which::which("true").unwrap().display(),
        test_binary.display()
    );
    fs::write(tmp.path().join("psp-build.toml"), config).unwrap();

    let output = psp_build(tmp.path())
        .args(["--message-format", "json", "run"])
        .args(["--compiler", "gcc", "--variant", "Release"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let test_output = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|e| e["reason"] == "stage-output" && e["stage"] == "test")
        .unwrap();
    assert_eq!(test_output["exit_code"], 0);
    assert_eq!(test_output["stdout"], "12 tests passed\n");
}

// ============================================================================
// psp-build matrix / doctor / completions
// ============================================================================

#[test]
fn test_matrix_lists_every_pair() {
    let tmp = project(None);

    let output = psp_build(tmp.path()).arg("matrix").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(rows.len(), 21);

    let unsupported: Vec<_> = rows.iter().filter(|r| r.contains("unsupported")).collect();
    assert_eq!(unsupported.len(), 1);
    assert!(unsupported[0].starts_with("gcc"));
    assert!(unsupported[0].contains("Msan"));

    assert_eq!(rows.iter().filter(|r| r.contains("build-only")).count(), 7);
}

#[test]
fn test_doctor_fails_when_generator_missing() {
    let tmp = project(Some(MISSING_GENERATOR));

    psp_build(tmp.path())
        .arg("doctor")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[!!] Generator"))
        .stdout(predicate::str::contains("required check(s) failed"));
}

#[test]
fn test_completions_bash() {
    let tmp = project(None);

    psp_build(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("psp-build"));
}
