//! Integration tests for the `tandem` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn tandem() -> Command {
    let mut cmd = Command::cargo_bin("tandem").unwrap();
    cmd.arg("--no-color");
    cmd
}

#[test]
fn test_help_lists_commands() {
    tandem()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_check_schema() {
    tandem()
        .args(["check", "--schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"clientURL\""))
        .stdout(predicate::str::contains("\"hasServer\""));
}

#[test]
fn test_check_example_is_valid_json() {
    let output = tandem().args(["check", "--example"]).output().unwrap();
    assert!(output.status.success());

    let example: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(example.get("client").is_some());
}

#[test]
fn test_check_valid_project() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("tandem.config.json"),
        r#"{ "hasServer": false, "client": { "command": ["make", "client"] } }"#,
    )
    .unwrap();

    tandem()
        .arg("check")
        .arg("--cwd")
        .arg(temp.path())
        .assert()
        .success();
}

#[test]
fn test_check_invalid_project() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("tandem.config.json"),
        r#"{ "hasServer": "sometimes" }"#,
    )
    .unwrap();

    tandem()
        .arg("check")
        .arg("--cwd")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_check_missing_config_file() {
    let temp = TempDir::new().unwrap();

    tandem()
        .arg("check")
        .arg("--cwd")
        .arg(temp.path())
        .args(["--config", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_dev_missing_cwd() {
    let temp = TempDir::new().unwrap();

    tandem()
        .arg("dev")
        .arg("--cwd")
        .arg(temp.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    tandem()
        .args(["--quiet", "--verbose", "check", "--schema"])
        .assert()
        .failure();
}
