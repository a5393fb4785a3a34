//! `slngen plan`, `targets` and `info` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_prints_configurations_without_writing() {
  let env = TestEnv::from_fixture("demo.json");

  env
    .cmd()
    .arg("plan")
    .arg(&env.input)
    .assert()
    .success()
    .stdout(predicate::str::contains("Solution Demo: 4 target(s), 8 configuration(s)"))
    .stdout(predicate::str::contains("linux|Release"))
    .stdout(predicate::str::contains("USE_CORE=1"));

  assert!(!env.out_dir().exists());
}

#[test]
fn plan_json_lists_excluded_projects() {
  let env = TestEnv::from_fixture("exclusion.json");

  let output = env
    .cmd()
    .arg("plan")
    .arg(&env.input)
    .arg("--format")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let targets = plan["targets"].as_array().unwrap();
  assert_eq!(targets.len(), 2);
  assert_eq!(targets[0]["label"], "win|Release");
  assert_eq!(targets[1]["label"], "linux|Release");
  assert_eq!(targets[1]["excluded"], serde_json::json!(["Gfx", "Viewer"]));
  assert_eq!(targets[1]["configurations"].as_array().unwrap().len(), 1);
  assert_eq!(targets[1]["configurations"][0]["project_id"], "Tool");
}

#[test]
fn targets_marks_selection() {
  let env = TestEnv::from_fixture("exclusion.json");

  env
    .cmd()
    .arg("targets")
    .arg(&env.input)
    .assert()
    .success()
    .stdout(predicate::str::contains("win|Debug"))
    .stdout(predicate::str::contains("Selected: 2 of 4"));
}

#[test]
fn targets_json() {
  let env = TestEnv::from_fixture("demo.json");

  let output = env
    .cmd()
    .args(["--format", "json", "targets"])
    .arg(&env.input)
    .output()
    .unwrap();
  assert!(output.status.success());

  let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(listing["axes"][0]["name"], "platform");
  let targets = listing["targets"].as_array().unwrap();
  assert_eq!(targets.len(), 4);
  assert!(targets.iter().all(|t| t["selected"] == true));
}

#[test]
fn info_lists_backends() {
  let env = TestEnv::from_fixture("demo.json");

  env
    .cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("json, msbuild"));
}
