//! Shared test helpers for CLI integration tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment with a declaration file and an output directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub input: PathBuf,
}

impl TestEnv {
  /// Copy a fixture into a fresh temporary directory as `slngen.json`.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("slngen.json");
    std::fs::write(&input, fixture_content(name)).unwrap();
    Self { temp, input }
  }

  pub fn out_dir(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("slngen");
    cmd.current_dir(self.temp.path()).env_remove("RUST_LOG");
    cmd
  }

  /// `slngen generate <input> --out <out> --backend <backend>`.
  pub fn generate(&self, backend: &str) -> Command {
    let mut cmd = self.cmd();
    cmd
      .arg("generate")
      .arg(&self.input)
      .arg("--out")
      .arg(self.out_dir())
      .arg("--backend")
      .arg(backend);
    cmd
  }

  /// Read an output file as a string.
  pub fn output(&self, relative: &str) -> String {
    let path = self.out_dir().join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
  }

  pub fn output_json(&self, relative: &str) -> serde_json::Value {
    serde_json::from_str(&self.output(relative)).unwrap()
  }
}

/// SHA-256 of every file under `dir`, keyed by relative path.
pub fn hash_tree(dir: &Path) -> BTreeMap<String, String> {
  let mut hashes = BTreeMap::new();
  for entry in std::fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_file() {
      let bytes = std::fs::read(&path).unwrap();
      let name = path.file_name().unwrap().to_string_lossy().into_owned();
      hashes.insert(name, hex::encode(Sha256::digest(&bytes)));
    }
  }
  hashes
}
