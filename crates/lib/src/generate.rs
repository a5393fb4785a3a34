//! The load, assemble and emit pipeline behind `slngen generate`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::emit::{BackendKind, EmitError, EmitReport, emit};
use crate::loader::{self, LoadError, Loaded};
use crate::solution::{AssembleError, Assembler, Assembly};

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
  pub out_dir: PathBuf,
  pub backend: BackendKind,
  /// Worker pool size; `None` uses available parallelism.
  pub jobs: Option<usize>,
}

impl GenerateOptions {
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      backend: BackendKind::default(),
      jobs: None,
    }
  }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
  pub solution: String,
  pub backend: BackendKind,
  pub targets: usize,
  pub configurations: usize,
  #[serde(flatten)]
  pub emit: EmitReport,
}

/// One reportable problem, for text or JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub kind: &'static str,
  pub message: String,
}

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error(transparent)]
  Load(#[from] LoadError),

  #[error("solution assembly failed with {} error(s)", .0.len())]
  Assemble(Vec<AssembleError>),

  #[error(transparent)]
  Emit(#[from] EmitError),

  #[error("{} of {} file(s) could not be written", .0.failed.len(), .0.total())]
  Write(EmitReport),
}

impl GenerateError {
  /// Every underlying problem, flattened.
  pub fn diagnostics(&self) -> Vec<Diagnostic> {
    match self {
      Self::Load(LoadError::Invalid(errors)) => errors
        .iter()
        .map(|e| Diagnostic {
          kind: e.kind(),
          message: e.to_string(),
        })
        .collect(),
      Self::Load(e) => vec![Diagnostic {
        kind: e.kind(),
        message: e.to_string(),
      }],
      Self::Assemble(errors) => errors
        .iter()
        .map(|e| Diagnostic {
          kind: e.kind(),
          message: e.to_string(),
        })
        .collect(),
      Self::Emit(e) => vec![emit_diagnostic(e)],
      Self::Write(report) => report.errors().iter().map(emit_diagnostic).collect(),
    }
  }
}

fn emit_diagnostic(err: &EmitError) -> Diagnostic {
  let kind = match err {
    EmitError::Io { .. } => "EmitIo",
    EmitError::DuplicatePath { .. } => "DuplicatePath",
    EmitError::EscapingPath { .. } => "EscapingPath",
    EmitError::ConfigurationCollision { .. } => "ConfigurationCollision",
    EmitError::Serialize { .. } => "SerializeError",
    EmitError::UnknownBackend(_) => "UnknownBackend",
  };
  Diagnostic {
    kind,
    message: err.to_string(),
  }
}

/// Load `input` and assemble its solution without writing anything.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn plan(input: &Path, jobs: Option<usize>) -> Result<(Loaded, Assembly), GenerateError> {
  let loaded = loader::load(input)?;
  let assembly = Assembler::new(&loaded.context)
    .jobs(jobs)
    .assemble(&loaded.solution)
    .map_err(GenerateError::Assemble)?;
  Ok((loaded, assembly))
}

/// Load, assemble and emit. Nothing is written unless resolution succeeds.
#[instrument(skip_all, fields(input = %input.display(), backend = %options.backend))]
pub fn generate(input: &Path, options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
  let (_, assembly) = plan(input, options.jobs)?;

  let backend = options.backend.backend();
  let report = emit(&assembly, backend.as_ref(), &options.out_dir)?;
  if !report.is_success() {
    return Err(GenerateError::Write(report));
  }

  info!(
    solution = assembly.name(),
    targets = assembly.target_count(),
    configurations = assembly.configuration_count(),
    "generation complete"
  );
  Ok(GenerateReport {
    solution: assembly.name().to_string(),
    backend: options.backend,
    targets: assembly.target_count(),
    configurations: assembly.configuration_count(),
    emit: report,
  })
}
