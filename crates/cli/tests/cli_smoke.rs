//! CLI smoke tests for crossforge.
//!
//! These tests verify that every command parses, runs without panicking and
//! returns an appropriate exit code. None of them need a Go toolchain.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn crossforge() -> Command {
  let mut cmd = cargo_bin_cmd!("crossforge");
  cmd.env_remove("RUST_LOG");
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  crossforge()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  crossforge()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("crossforge"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "resolve", "groups", "list", "env"] {
    crossforge()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn unknown_subcommand_fails() {
  crossforge().arg("deploy").assert().failure();
}

// =============================================================================
// groups
// =============================================================================

#[test]
fn groups_lists_builtin_groups() {
  crossforge()
    .arg("groups")
    .assert()
    .success()
    .stdout(predicate::str::contains("desktop"))
    .stdout(predicate::str::contains("mobile"))
    .stdout(predicate::str::contains("web"));
}

#[test]
fn groups_shows_one_group() {
  crossforge()
    .args(["groups", "darwin"])
    .assert()
    .success()
    .stdout(predicate::str::contains("darwin/amd64,darwin/arm64"));
}

#[test]
fn groups_unknown_name_fails() {
  crossforge()
    .args(["groups", "dekstop"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown group 'dekstop'"));
}

#[test]
fn groups_json_output_is_valid() {
  let assert = crossforge().args(["groups", "--format", "json"]).assert().success();
  let groups: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  assert!(groups.as_array().unwrap().iter().any(|g| g["name"] == "server"));
}

// =============================================================================
// list
// =============================================================================

#[test]
fn list_offline_uses_static_catalog() {
  crossforge()
    .args(["list", "--offline"])
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/amd64"))
    .stdout(predicate::str::contains("js/wasm"))
    .stderr(predicate::str::contains("static list"));
}

#[test]
fn list_filters_by_os() {
  crossforge()
    .args(["list", "--offline", "--os", "darwin"])
    .assert()
    .success()
    .stdout(predicate::str::contains("darwin/arm64"))
    .stdout(predicate::str::contains("linux/").not());
}

#[test]
fn list_falls_back_when_go_is_missing() {
  crossforge()
    .args(["list", "--go", "/nonexistent/go", "--format", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"static\": true"));
}

// =============================================================================
// resolve
// =============================================================================

#[test]
fn resolve_group_minus_exclusion() {
  crossforge()
    .args(["resolve", "--offline", "-p", "desktop", "--exclude", "windows"])
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/amd64"))
    .stdout(predicate::str::contains("windows/").not());
}

#[test]
fn resolve_unknown_group_in_list_fails() {
  crossforge()
    .args(["resolve", "--offline", "--include", "dekstop"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown platform group 'dekstop'"));
}

#[test]
fn resolve_malformed_platform_fails() {
  crossforge()
    .args(["resolve", "--offline", "-p", "linux/arm/v7"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("malformed platform"));
}

#[test]
fn resolve_only_and_except_conflict() {
  crossforge()
    .args(["resolve", "--offline", "--only", "desktop", "--except", "mobile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn resolve_inline_custom_group() {
  crossforge()
    .args(["resolve", "--offline", "-p", "web", "--group", "edge:linux/arm64,linux/arm"])
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/arm64"))
    .stdout(predicate::str::contains("js/wasm"));
}

// =============================================================================
// env
// =============================================================================

#[test]
fn env_reports_probe() {
  crossforge()
    .arg("env")
    .assert()
    .success()
    .stdout(predicate::str::contains("Compilers:"));
}

#[test]
fn env_derives_platform_variables() {
  crossforge()
    .args(["env", "-p", "windows/arm64", "--cgo", "off"])
    .assert()
    .success()
    .stdout(predicate::str::contains("GOOS=windows"))
    .stdout(predicate::str::contains("GOARCH=arm64"))
    .stdout(predicate::str::contains("CGO_ENABLED=0"));
}

#[test]
fn env_rejects_malformed_platform() {
  crossforge().args(["env", "-p", "linux"]).assert().failure();
}
