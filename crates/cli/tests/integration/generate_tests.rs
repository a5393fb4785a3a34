//! `slngen generate` integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, hash_tree};

#[test]
fn generate_json_demo() {
  let env = TestEnv::from_fixture("demo.json");

  env
    .generate("json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated Demo (json)"))
    .stdout(predicate::str::contains("Configurations: 8"));

  let solution = env.output_json("Demo.sln.json");
  assert_eq!(solution["name"], "Demo");
  assert_eq!(solution["targets"].as_array().unwrap().len(), 4);
  assert_eq!(solution["projects"][0]["id"], "Core");
  assert_eq!(solution["projects"][1]["dependencies"][0], "Core");

  let app = env.output_json("App.proj.json");
  let configurations = app["configurations"].as_array().unwrap();
  assert_eq!(configurations.len(), 4);
  for config in configurations {
    assert_eq!(config["settings"]["defines"], serde_json::json!(["USE_CORE=1"]));
    assert_eq!(config["settings"]["include_paths"], serde_json::json!(["core/include"]));
    assert_eq!(config["settings"]["subsystem"], serde_json::json!(["console"]));
  }

  let core = env.output_json("Core.proj.json");
  assert_eq!(
    core["configurations"][0]["settings"]["defines"],
    serde_json::json!(["USE_CORE=1", "CORE_INTERNAL", "_DEBUG"])
  );
  assert_eq!(
    core["configurations"][1]["settings"]["defines"],
    serde_json::json!(["USE_CORE=1", "CORE_INTERNAL"])
  );
  assert_eq!(core["configurations"][0]["output_path"], "output/win_Debug/Core");
}

#[test]
fn regeneration_is_byte_identical() {
  let env = TestEnv::from_fixture("demo.json");

  env.generate("msbuild").assert().success();
  let first = hash_tree(&env.out_dir());
  assert_eq!(first.len(), 3);

  env
    .generate("msbuild")
    .assert()
    .success()
    .stdout(predicate::str::contains("Written: 0"))
    .stdout(predicate::str::contains("Unchanged: 3"));
  assert_eq!(hash_tree(&env.out_dir()), first);
}

#[test]
fn worker_count_does_not_change_output() {
  let serial = TestEnv::from_fixture("demo.json");
  serial.generate("json").arg("--jobs").arg("1").assert().success();

  let parallel = TestEnv::from_fixture("demo.json");
  parallel.generate("json").arg("--jobs").arg("8").assert().success();

  assert_eq!(hash_tree(&serial.out_dir()), hash_tree(&parallel.out_dir()));
}

#[test]
fn generate_msbuild_demo() {
  let env = TestEnv::from_fixture("demo.json");
  env.generate("msbuild").assert().success();

  let sln = env.output("Demo.sln");
  assert!(sln.starts_with("Microsoft Visual Studio Solution File"));
  assert!(sln.contains("Debug|win = Debug|win\r\n"));
  assert!(sln.contains("Release|linux = Release|linux\r\n"));

  let app = env.output("App.vcxproj");
  assert!(app.contains("<ProjectReference Include=\"Core.vcxproj\">"));
  assert!(app.contains("<SubSystem>Console</SubSystem>"));

  let core = env.output("Core.vcxproj");
  assert!(core.contains("<ConfigurationType>StaticLibrary</ConfigurationType>"));
  assert!(core.contains("USE_CORE=1;CORE_INTERNAL;_DEBUG;%(PreprocessorDefinitions)"));
}

#[test]
fn solution_files_split_by_template() {
  let env = TestEnv::from_fixture("split.json");
  env.generate("msbuild").assert().success();

  let files = hash_tree(&env.out_dir());
  let names: Vec<_> = files.keys().map(String::as_str).collect();
  assert_eq!(
    names,
    ["Engine.vcxproj", "Game.vcxproj", "Game_vs2019.sln", "Game_vs2022.sln"]
  );

  let vs2019 = env.output("Game_vs2019.sln");
  assert!(vs2019.contains("vs2019_Debug|win64 = vs2019_Debug|win64"));
  assert!(!vs2019.contains("vs2022"));
}

#[test]
fn exclusion_cascades_to_dependents() {
  let env = TestEnv::from_fixture("exclusion.json");
  env.generate("json").assert().success();

  let count = |file: &str| env.output_json(file)["configurations"].as_array().unwrap().len();
  assert_eq!(count("Gfx.proj.json"), 1);
  assert_eq!(count("Viewer.proj.json"), 1);
  assert_eq!(count("Tool.proj.json"), 2);

  let viewer = env.output_json("Viewer.proj.json");
  assert_eq!(viewer["configurations"][0]["target"]["platform"], "win");
}

#[test]
fn cycle_fails_without_writing() {
  let env = TestEnv::from_fixture("cycle.json");

  env
    .generate("json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("[CyclicDependency]"))
    .stderr(predicate::str::contains("A -> B -> A"));

  assert!(!env.out_dir().exists());
}

#[test]
fn cycle_reported_as_json() {
  let env = TestEnv::from_fixture("cycle.json");

  let output = env.generate("json").arg("--format").arg("json").output().unwrap();
  assert!(!output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let errors = report["errors"].as_array().unwrap();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0]["kind"], "CyclicDependency");
}

#[test]
fn every_declaration_error_is_listed() {
  let env = TestEnv::from_fixture("invalid.json");

  env
    .generate("json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("[DuplicateProjectId]"))
    .stderr(predicate::str::contains("[UnknownProject]"))
    .stderr(predicate::str::contains("Missing"));
}

#[test]
fn json_report_lists_written_files() {
  let env = TestEnv::from_fixture("demo.json");

  let output = env.generate("json").arg("--format").arg("json").output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["solution"], "Demo");
  assert_eq!(report["backend"], "json");
  assert_eq!(report["targets"], 4);
  assert_eq!(report["written"].as_array().unwrap().len(), 3);
  assert!(report["failed"].as_array().unwrap().is_empty());
}
