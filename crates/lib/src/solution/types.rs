//! Solution declarations and assembled results.

use serde::Serialize;
use thiserror::Error;

use crate::axis::{AxisError, Target, TargetSelector};
use crate::consts::DEFAULT_SOLUTION_FILE_NAME;
use crate::project::{OutputKind, ProjectError, ProjectRef};
use crate::resolve::{ResolveError, ResolvedConfiguration, TargetResolution};
use crate::template::TemplateError;

/// What a solution contains: root projects and a target subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDecl {
  pub name: String,
  /// Root projects; their dependencies are pulled in transitively.
  pub roots: Vec<ProjectRef>,
  /// Target subset. Empty means every target.
  pub selectors: Vec<TargetSelector>,
  /// Template for the solution file name, rendered per target.
  pub file_name: String,
}

impl SolutionDecl {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      roots: Vec::new(),
      selectors: Vec::new(),
      file_name: DEFAULT_SOLUTION_FILE_NAME.to_string(),
    }
  }

  pub fn root(mut self, id: impl Into<ProjectRef>) -> Self {
    self.roots.push(id.into());
    self
  }

  pub fn select(mut self, selector: TargetSelector) -> Self {
    self.selectors.push(selector);
    self
  }

  pub fn file_name(mut self, template: impl Into<String>) -> Self {
    self.file_name = template.into();
    self
  }
}

/// A project that belongs to an assembled solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
  pub id: String,
  pub kind: OutputKind,
  /// Declared dependencies, in order.
  pub dependencies: Vec<String>,
}

/// One solution file and the targets it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionFile {
  /// Rendered file name without extension.
  pub name: String,
  /// Indices into [`Assembly::targets`], in enumeration order.
  pub targets: Vec<usize>,
}

/// The result of assembling one solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
  pub(crate) name: String,
  pub(crate) projects: Vec<ProjectSummary>,
  pub(crate) resolutions: Vec<TargetResolution>,
  pub(crate) files: Vec<SolutionFile>,
}

impl Assembly {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Member projects in declaration order.
  pub fn projects(&self) -> &[ProjectSummary] {
    &self.projects
  }

  pub fn project(&self, id: &str) -> Option<&ProjectSummary> {
    self.projects.iter().find(|p| p.id == id)
  }

  /// Selected targets in enumeration order.
  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.resolutions.iter().map(TargetResolution::target)
  }

  pub fn target_count(&self) -> usize {
    self.resolutions.len()
  }

  /// Per-target resolutions in enumeration order.
  pub fn resolutions(&self) -> &[TargetResolution] {
    &self.resolutions
  }

  pub fn resolution(&self, target: &Target) -> Option<&TargetResolution> {
    self.resolutions.iter().find(|r| r.target() == target)
  }

  /// Every configuration of project `id`, in target order.
  pub fn configurations_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ResolvedConfiguration> + 'a {
    self.resolutions.iter().filter_map(move |r| r.get(id))
  }

  /// Total number of resolved configurations.
  pub fn configuration_count(&self) -> usize {
    self.resolutions.iter().map(TargetResolution::len).sum()
  }

  /// Solution files grouped by rendered name, in order of first appearance.
  pub fn files(&self) -> &[SolutionFile] {
    &self.files
  }
}

/// Errors raised while assembling a solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
  #[error("solution root: {0}")]
  Root(#[source] ProjectError),

  #[error("invalid target selector: {0}")]
  Selector(#[source] AxisError),

  #[error("invalid solution file name '{template}': {source}")]
  FileName {
    template: String,
    #[source]
    source: TemplateError,
  },

  /// The selected target subset is empty.
  #[error("solution '{solution}' selects no targets")]
  EmptyTargetSet { solution: String },

  /// A resolution error, reported once with every target it occurred on.
  #[error("{error} [{}]", .targets.join(", "))]
  Resolve { error: ResolveError, targets: Vec<String> },

  #[error("failed to start worker pool: {0}")]
  Pool(String),
}

impl AssembleError {
  /// Short machine readable name of the failure class.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Root(ProjectError::UnknownProject { .. }) => "UnknownProject",
      Self::Root(_) => "InvalidRoot",
      Self::Selector(_) => "InvalidSelector",
      Self::FileName { .. } => "InvalidFileName",
      Self::EmptyTargetSet { .. } => "EmptyTargetSet",
      Self::Resolve { error, .. } => match error {
        ResolveError::CyclicDependency { .. } => "CyclicDependency",
        ResolveError::ConflictingOutputKind(_) => "ConflictingOutputKind",
        ResolveError::ConflictingSetting { .. } => "ConflictingSetting",
        ResolveError::OutputPath { .. } => "InvalidOutputPath",
      },
      Self::Pool(_) => "Pool",
    }
  }
}
