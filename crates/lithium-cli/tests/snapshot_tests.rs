//! Output-shape stability tests for the `lithium` binary.
//!
//! Exercises JSON output across commands to guard against accidental
//! schema changes, without pulling in a dedicated snapshot-testing crate.

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn lithium() -> Command {
    Command::new(cargo_bin!("lithium"))
}

fn write_addon(root: &std::path::Path, name: &str, version: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("package.json"),
        format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
    )
    .unwrap();
}

#[test]
fn scan_json_has_expected_top_level_shape() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0");

    let output = lithium()
        .args(["--format", "json", "scan", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert!(value.is_object());
    assert!(value.get("addons").is_some());
    assert!(value.get("projects").is_some());
}

#[test]
fn resolve_json_has_expected_top_level_shape() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0");

    let output = lithium()
        .args(["--format", "json", "resolve", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert!(value.get("order").is_some());
    assert!(value.get("system_dependencies").is_some());
}

#[test]
fn validate_json_has_expected_top_level_shape() {
    let dir = TempDir::new().unwrap();
    write_addon(dir.path(), "core", "1.0.0");

    let output = lithium()
        .args([
            "--format",
            "json",
            "validate",
            dir.path().join("core").to_str().unwrap(),
        ])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["success"], serde_json::json!(true));
    assert!(value.get("manifest").is_some());
}

#[test]
fn doctor_json_has_expected_top_level_shape() {
    let dir = TempDir::new().unwrap();

    let output = lithium()
        .args(["--format", "json", "doctor", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert!(value.get("toolchains_found").is_some());
    assert!(value.get("issues").is_some());
}
