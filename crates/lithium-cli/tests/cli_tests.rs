//! CLI integration tests for the `lithium` binary.

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn lithium() -> Command {
    Command::new(cargo_bin!("lithium"))
}

fn write_addon(root: &std::path::Path, name: &str, version: &str, deps: &[(&str, &str)]) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let mut deps_json = String::new();
    for (i, (dep, constraint)) in deps.iter().enumerate() {
        if i > 0 {
            deps_json.push(',');
        }
        deps_json.push_str(&format!("\"{dep}\": \"{constraint}\""));
    }
    std::fs::write(
        dir.join("package.json"),
        format!(r#"{{"name": "{name}", "version": "{version}", "dependencies": {{{deps_json}}}}}"#),
    )
    .unwrap();
}

#[test]
fn test_help_output() {
    lithium()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lithium"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("sandbox"));
}

#[test]
fn test_version_output() {
    lithium().arg("--version").assert().success();
}

#[test]
fn test_no_args_shows_help() {
    lithium().assert().failure();
}

#[test]
fn test_scan_finds_addons() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0", &[]);

    lithium()
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("core"));
}

#[test]
fn test_scan_empty_directory_reports_zero_addons() {
    let dir = TempDir::new().unwrap();

    lithium()
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("no addon manifests found"));
}

#[test]
fn test_resolve_orders_by_dependency() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "upstream", "1.0.0", &[]);
    write_addon(dir.path(), "downstream", "1.0.0", &[("upstream", "^1.0.0")]);

    lithium()
        .args(["resolve", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("upstream"))
        .stdout(predicate::str::contains("downstream"));
}

#[test]
fn test_resolve_reports_cycle() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "a", "1.0.0", &[("b", "^1.0.0")]);
    write_addon(dir.path(), "b", "1.0.0", &[("a", "^1.0.0")]);

    lithium()
        .args(["resolve", dir.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_validate_accepts_well_formed_manifest() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0", &[]);

    lithium()
        .args(["validate", dir.path().join("core").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_rejects_missing_manifest() {
    let dir = TempDir::new().unwrap();

    lithium()
        .args(["validate", dir.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_json_format_is_valid_json() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0", &[]);

    let output = lithium()
        .args(["--format", "json", "scan", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["addons"].as_array().unwrap().iter().any(|a| a == "core"));
}

#[test]
fn test_doctor_reports_configuration() {
    let dir = TempDir::new().unwrap();

    lithium()
        .args(["doctor", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("addon root"));
}
