//! Emission: turning an [`Assembly`] into files on disk.
//!
//! A [`Backend`] renders an assembly into in-memory [`RenderedFile`]s. The
//! [`emit`] driver checks the set for path collisions and writes every file
//! through [`write_if_changed`], so regenerating an unchanged solution leaves
//! the output directory untouched.

mod json;
mod msbuild;
mod write;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::solution::Assembly;

pub use json::JsonBackend;
pub use msbuild::{MsBuildBackend, xml_escape};
pub use write::{WriteOutcome, write_if_changed};

/// One output file produced by a backend, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
  pub path: PathBuf,
  pub contents: Vec<u8>,
}

/// Renders an assembly into files.
///
/// Rendering is pure: the same assembly always yields byte-identical output.
pub trait Backend: Send + Sync {
  fn name(&self) -> &'static str;

  fn render(&self, assembly: &Assembly) -> Result<Vec<RenderedFile>, EmitError>;
}

/// Built-in backends selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  #[default]
  Json,
  Msbuild,
}

impl BackendKind {
  pub const ALL: [BackendKind; 2] = [BackendKind::Json, BackendKind::Msbuild];

  pub fn as_str(&self) -> &'static str {
    match self {
      BackendKind::Json => "json",
      BackendKind::Msbuild => "msbuild",
    }
  }

  pub fn backend(&self) -> Box<dyn Backend> {
    match self {
      BackendKind::Json => Box::new(JsonBackend),
      BackendKind::Msbuild => Box::new(MsBuildBackend),
    }
  }
}

impl std::fmt::Display for BackendKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BackendKind {
  type Err = EmitError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    BackendKind::ALL
      .into_iter()
      .find(|k| k.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| EmitError::UnknownBackend(s.to_string()))
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
  #[error("unknown backend '{0}'")]
  UnknownBackend(String),

  #[error("failed to serialize {path}: {message}")]
  Serialize { path: String, message: String },

  #[error("backend produced {path} more than once")]
  DuplicatePath { path: String },

  #[error("{path} does not stay inside the output directory")]
  EscapingPath { path: String },

  #[error("targets {first} and {second} both map to configuration '{name}'")]
  ConfigurationCollision { name: String, first: String, second: String },

  #[error("failed to write {path}: {message}")]
  Io { path: String, message: String },
}

/// A file that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedWrite {
  pub path: PathBuf,
  pub message: String,
}

impl From<&FailedWrite> for EmitError {
  fn from(failed: &FailedWrite) -> Self {
    EmitError::Io {
      path: failed.path.display().to_string(),
      message: failed.message.clone(),
    }
  }
}

/// Per-file results of one [`emit`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitReport {
  pub written: Vec<PathBuf>,
  pub unchanged: Vec<PathBuf>,
  pub failed: Vec<FailedWrite>,
}

impl EmitReport {
  pub fn total(&self) -> usize {
    self.written.len() + self.unchanged.len() + self.failed.len()
  }

  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }

  /// One [`EmitError::Io`] per failed file.
  pub fn errors(&self) -> Vec<EmitError> {
    self.failed.iter().map(EmitError::from).collect()
  }
}

/// Render `assembly` with `backend` and write the result under `out_dir`.
///
/// Files are written in parallel. A failed write does not stop the others
/// and nothing is rolled back; failures land in [`EmitReport::failed`].
pub fn emit(assembly: &Assembly, backend: &dyn Backend, out_dir: &Path) -> Result<EmitReport, EmitError> {
  let files = backend.render(assembly)?;

  let mut seen = HashSet::with_capacity(files.len());
  for file in &files {
    if !is_relative_inside(&file.path) {
      return Err(EmitError::EscapingPath {
        path: file.path.display().to_string(),
      });
    }
    if !seen.insert(file.path.as_path()) {
      return Err(EmitError::DuplicatePath {
        path: file.path.display().to_string(),
      });
    }
  }

  info!(
    backend = backend.name(),
    solution = assembly.name(),
    files = files.len(),
    out_dir = %out_dir.display(),
    "emitting"
  );

  let results: Vec<(PathBuf, std::io::Result<WriteOutcome>)> = files
    .par_iter()
    .map(|file| {
      let path = out_dir.join(&file.path);
      let outcome = write_if_changed(&path, &file.contents);
      (path, outcome)
    })
    .collect();

  let mut report = EmitReport::default();
  for (path, outcome) in results {
    match outcome {
      Ok(WriteOutcome::Written) => {
        debug!(path = %path.display(), "written");
        report.written.push(path);
      }
      Ok(WriteOutcome::Unchanged) => {
        debug!(path = %path.display(), "unchanged");
        report.unchanged.push(path);
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "write failed");
        report.failed.push(FailedWrite {
          path,
          message: e.to_string(),
        });
      }
    }
  }

  info!(
    written = report.written.len(),
    unchanged = report.unchanged.len(),
    failed = report.failed.len(),
    "emit complete"
  );
  Ok(report)
}

/// A non-empty relative path made only of plain names.
fn is_relative_inside(path: &Path) -> bool {
  let mut components = path.components().peekable();
  components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}
