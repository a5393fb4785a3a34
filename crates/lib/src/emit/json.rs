//! Canonical JSON backend.
//!
//! Writes `<solution>.sln.json` with the solution layout and one
//! `<project>.proj.json` per member project with every resolved
//! configuration.

use std::path::PathBuf;

use serde::Serialize;

use crate::axis::Target;
use crate::project::OutputKind;
use crate::settings::MergedSettings;
use crate::solution::{Assembly, ProjectSummary};

use super::{Backend, EmitError, RenderedFile};

/// The canonical backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

#[derive(Serialize)]
struct SolutionDocument<'a> {
  name: &'a str,
  targets: Vec<&'a Target>,
  projects: &'a [ProjectSummary],
  files: Vec<FileDocument<'a>>,
}

#[derive(Serialize)]
struct FileDocument<'a> {
  name: &'a str,
  targets: Vec<String>,
}

#[derive(Serialize)]
struct ProjectDocument<'a> {
  id: &'a str,
  kind: OutputKind,
  configurations: Vec<ConfigurationDocument<'a>>,
}

#[derive(Serialize)]
struct ConfigurationDocument<'a> {
  target: &'a Target,
  output_path: &'a str,
  dependencies: &'a [String],
  settings: &'a MergedSettings,
}

fn to_bytes<T: Serialize>(path: &str, value: &T) -> Result<Vec<u8>, EmitError> {
  let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| EmitError::Serialize {
    path: path.to_string(),
    message: e.to_string(),
  })?;
  bytes.push(b'\n');
  Ok(bytes)
}

impl Backend for JsonBackend {
  fn name(&self) -> &'static str {
    "json"
  }

  fn render(&self, assembly: &Assembly) -> Result<Vec<RenderedFile>, EmitError> {
    let targets: Vec<&Target> = assembly.targets().collect();
    let mut files = Vec::with_capacity(assembly.projects().len() + 1);

    let solution_path = format!("{}.sln.json", assembly.name());
    let document = SolutionDocument {
      name: assembly.name(),
      targets: targets.clone(),
      projects: assembly.projects(),
      files: assembly
        .files()
        .iter()
        .map(|f| FileDocument {
          name: &f.name,
          targets: f.targets.iter().map(|&i| targets[i].label()).collect(),
        })
        .collect(),
    };
    files.push(RenderedFile {
      contents: to_bytes(&solution_path, &document)?,
      path: PathBuf::from(solution_path),
    });

    for project in assembly.projects() {
      let path = format!("{}.proj.json", project.id);
      let document = ProjectDocument {
        id: &project.id,
        kind: project.kind,
        configurations: assembly
          .configurations_of(&project.id)
          .map(|c| ConfigurationDocument {
            target: &c.target,
            output_path: &c.output_path,
            dependencies: &c.dependencies,
            settings: &c.merged,
          })
          .collect(),
      };
      files.push(RenderedFile {
        contents: to_bytes(&path, &document)?,
        path: PathBuf::from(path),
      });
    }

    Ok(files)
  }
}
