use predicates::prelude::*;

use super::common::{TestEnv, crossforge};

#[test]
fn saved_groups_load_back_as_overrides() {
  let env = TestEnv::new();
  let path = env.temp.path().join("groups.json");

  crossforge()
    .args(["groups", "--save"])
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Saved"));

  let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert!(saved["groups"].as_array().unwrap().len() >= 13);

  crossforge()
    .args(["groups", "desktop", "--groups-file"])
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/amd64"));
}

#[test]
fn user_group_file_overrides_builtin() {
  let env = TestEnv::new();
  let path = env.write_file(
    "groups.json",
    r#"{ "groups": [ { "name": "desktop", "platforms": ["linux/riscv64"] } ] }"#,
  );

  crossforge()
    .args(["resolve", "--offline", "-p", "desktop", "--groups-file"])
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/riscv64"))
    .stdout(predicate::str::contains("windows/amd64").not());
}

#[test]
fn malformed_group_file_fails() {
  let env = TestEnv::new();
  let path = env.write_file("groups.json", "{ not json");

  crossforge()
    .args(["groups", "--groups-file"])
    .arg(&path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load groups"));
}
