//! Load, assemble and emit through the public pipeline.

use std::fs;
use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;

use slngen_lib::emit::{BackendKind, JsonBackend, emit};
use slngen_lib::generate::{GenerateOptions, generate};
use slngen_lib::loader;
use slngen_lib::solution::Assembler;
use slngen_lib::util::hash::hash_file;

const DECLARATION: &str = r#"{
  "axes": [
    { "name": "platform", "values": ["win", "linux"] },
    { "name": "mode", "values": ["Debug", "Release"] }
  ],
  "layout": { "output_path": "bin/[target.platform]/[target.mode]/[project.id]" },
  "projects": [
    { "id": "Core", "kind": "static_lib", "public": { "defines": "USE_CORE=1" } },
    { "id": "App", "kind": "executable", "dependencies": ["Core"] },
    { "id": "Unused", "kind": "executable", "dependencies": ["Nowhere"] }
  ],
  "solution": { "name": "Demo", "projects": ["App"] }
}"#;

fn write_declaration(dir: &Path, text: &str) -> std::path::PathBuf {
  let path = dir.join("slngen.json");
  fs::write(&path, text).unwrap();
  path
}

#[test]
fn unknown_dependency_anywhere_rejects_the_declaration() {
  let temp = TempDir::new().unwrap();
  let input = write_declaration(temp.path(), DECLARATION);

  let err = loader::load(&input).unwrap_err();
  assert_eq!(err.kind(), "InvalidDeclaration");
}

#[test]
fn assembly_covers_the_root_closure() {
  let declaration = DECLARATION.replace(r#", "dependencies": ["Nowhere"]"#, "");
  let loaded = loader::load_str(&declaration, "inline").unwrap();

  let assembly = Assembler::new(&loaded.context).assemble(&loaded.solution).unwrap();
  let ids: Vec<_> = assembly.projects().iter().map(|p| p.id.as_str()).collect();
  assert_eq!(ids, ["Core", "App"]);
  assert_eq!(assembly.configuration_count(), 8);

  let app = assembly.configurations_of("App").next().unwrap();
  assert_eq!(app.output_path, "bin/win/Debug/App");
  assert_eq!(app.merged.get("defines"), Some(&["USE_CORE=1".to_string()][..]));
}

#[test]
fn reemission_keeps_content_hashes() {
  let declaration = DECLARATION.replace(r#", "dependencies": ["Nowhere"]"#, "");
  let loaded = loader::load_str(&declaration, "inline").unwrap();
  let assembly = Assembler::new(&loaded.context).assemble(&loaded.solution).unwrap();
  let out = TempDir::new().unwrap();

  let first = emit(&assembly, &JsonBackend, out.path()).unwrap();
  let hashes: Vec<_> = first.written.iter().map(|p| hash_file(p).unwrap()).collect();

  let second = emit(&assembly, &JsonBackend, out.path()).unwrap();
  assert!(second.written.is_empty());
  let again: Vec<_> = second.unchanged.iter().map(|p| hash_file(p).unwrap()).collect();
  assert_eq!(hashes, again);
}

#[test]
#[serial]
fn relative_paths_resolve_against_the_working_directory() {
  let temp = TempDir::new().unwrap();
  let declaration = DECLARATION.replace(r#", "dependencies": ["Nowhere"]"#, "");
  write_declaration(temp.path(), &declaration);

  let previous = std::env::current_dir().unwrap();
  std::env::set_current_dir(temp.path()).unwrap();
  let mut options = GenerateOptions::new("out");
  options.backend = BackendKind::Msbuild;
  options.jobs = Some(2);
  let result = generate(Path::new("slngen.json"), &options);
  std::env::set_current_dir(previous).unwrap();

  let report = result.unwrap();
  assert_eq!(report.targets, 4);
  assert_eq!(report.emit.written.len(), 3);
  assert!(temp.path().join("out/Demo.sln").is_file());
  assert!(temp.path().join("out/App.vcxproj").is_file());
}
