use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn builds_every_platform_into_per_platform_dirs() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["-p", "linux/amd64,windows/amd64", "--cgo", "off"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Succeeded: 2"));

  let out = env.output_path();
  let linux = std::fs::read_to_string(out.join("linux/amd64/app")).unwrap();
  assert_eq!(linux.trim(), "linux/amd64 CGO_ENABLED=0");
  assert!(out.join("windows/amd64/app.exe").is_file());
}

#[test]
#[serial]
fn flat_layout_suffixes_names() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["-p", "linux/arm64,js/wasm", "--layout", "flat"])
    .assert()
    .success();

  let out = env.output_path();
  assert!(out.join("app-linux-arm64").is_file());
  assert!(out.join("app-js-wasm.wasm").is_file());
}

#[test]
#[serial]
fn persistent_failure_exits_nonzero_after_retries() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["-p", "linux/amd64,linux/arm64", "--max-retries", "1"])
    .env("FAIL_TARGETS", "linux/arm64")
    .assert()
    .failure()
    .stderr(predicate::str::contains("linux/arm64 failed after 2 attempt(s)"))
    .stderr(predicate::str::contains("undefined: main"))
    .stderr(predicate::str::contains("1 of 2 target(s) failed"));

  assert!(env.output_path().join("linux/amd64/app").is_file());
}

#[test]
#[serial]
fn flaky_target_recovers_in_fallback_round() {
  let env = TestEnv::new();
  let marker = env.temp.path().join("flaky.marker");

  env
    .build_cmd()
    .args(["-p", "linux/amd64,linux/arm64"])
    .env("FLAKY_TARGET", "linux/arm64")
    .env("FLAKY_MARKER", &marker)
    .assert()
    .success()
    .stderr(predicate::str::contains("attempt 1 failed, will retry"));

  assert!(env.output_path().join("linux/arm64/app").is_file());
}

#[test]
#[serial]
fn no_retry_reports_first_failure() {
  let env = TestEnv::new();
  let marker = env.temp.path().join("flaky.marker");

  env
    .build_cmd()
    .args(["-p", "linux/arm64", "--no-retry"])
    .env("FLAKY_TARGET", "linux/arm64")
    .env("FLAKY_MARKER", &marker)
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed after 1 attempt(s)"));
}

#[test]
#[serial]
fn json_report_lists_every_target() {
  let env = TestEnv::new();

  let assert = env
    .build_cmd()
    .args(["-p", "linux/amd64,darwin/arm64", "--format", "json"])
    .assert()
    .success();

  let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  let results = report["results"].as_array().unwrap();
  assert_eq!(results.len(), 2);
  assert_eq!(results[0]["platform"], "darwin/arm64");
  assert_eq!(results[0]["outcome"]["status"], "succeeded");
  assert_eq!(report["failed"], 0);
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn ios_is_skipped_on_linux_hosts() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["-p", "ios/arm64,linux/amd64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("ios/arm64 skipped"))
    .stdout(predicate::str::contains("Skipped: 1"))
    .stdout(predicate::str::contains("ios/arm64: requires a darwin host"));
}

#[test]
#[serial]
fn bare_os_without_native_arch_is_reported() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["-p", "js,linux/amd64", "--cgo", "off"])
    .assert()
    .success()
    .stderr(predicate::str::contains("skipping js: native architecture"))
    .stdout(predicate::str::contains("Succeeded: 1"));
}

#[test]
#[serial]
fn config_file_supplies_defaults() {
  let env = TestEnv::new();
  let config = env.write_file(
    "crossforge.toml",
    "platforms = \"linux/amd64\"\nlayout = \"flat\"\ncgo = \"off\"\n",
  );

  env.build_cmd().arg("-c").arg(&config).assert().success();

  assert!(env.output_path().join("app-linux-amd64").is_file());
}

#[test]
#[serial]
fn only_and_except_conflict() {
  let env = TestEnv::new();

  env
    .build_cmd()
    .args(["--only", "desktop", "--except", "mobile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be combined"));

  assert!(!env.output_path().exists());
}
