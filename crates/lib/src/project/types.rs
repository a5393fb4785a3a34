//! Project descriptor types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::axis::{AxisError, Target, TargetPattern, TargetRule, is_excluded};
use crate::settings::{SettingBlock, SettingEntry};

/// What a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
  Executable,
  StaticLib,
  DynamicLib,
}

impl OutputKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Executable => "executable",
      Self::StaticLib => "static_lib",
      Self::DynamicLib => "dynamic_lib",
    }
  }

  /// Whether the output is a separate link unit (loaded, not absorbed).
  pub fn is_link_unit(&self) -> bool {
    matches!(self, Self::Executable | Self::DynamicLib)
  }
}

impl std::fmt::Display for OutputKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A by-id reference to another project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectRef(pub String);

impl ProjectRef {
  pub fn id(&self) -> &str {
    &self.0
  }
}

impl From<&str> for ProjectRef {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

impl From<String> for ProjectRef {
  fn from(id: String) -> Self {
    Self(id)
  }
}

impl std::fmt::Display for ProjectRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Settings that only apply to targets matching `when`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalSettings {
  pub when: TargetPattern,
  pub settings: SettingBlock,
}

/// Declarative definition of one buildable project.
///
/// Created at load time and immutable once the generation context is
/// frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
  /// Unique project id.
  pub id: String,
  /// Output kind.
  pub kind: OutputKind,
  /// Settings applying to every target.
  pub settings: SettingBlock,
  /// Settings applying to matching targets, appended after `settings`.
  pub conditional: Vec<ConditionalSettings>,
  /// Dependencies in declared order.
  pub dependencies: Vec<ProjectRef>,
  /// Exclusion and inclusion rules over the target space.
  pub rules: Vec<TargetRule>,
}

impl ProjectDescriptor {
  pub fn new(id: impl Into<String>, kind: OutputKind) -> Self {
    Self {
      id: id.into(),
      kind,
      settings: SettingBlock::new(),
      conditional: Vec::new(),
      dependencies: Vec::new(),
      rules: Vec::new(),
    }
  }

  /// Replace the unconditional settings.
  pub fn with_settings(mut self, settings: SettingBlock) -> Self {
    self.settings = settings;
    self
  }

  /// Add settings applying only to targets matching `when`.
  pub fn when(mut self, when: TargetPattern, settings: SettingBlock) -> Self {
    self.conditional.push(ConditionalSettings { when, settings });
    self
  }

  /// Append a dependency.
  pub fn depends_on(mut self, id: impl Into<ProjectRef>) -> Self {
    self.dependencies.push(id.into());
    self
  }

  /// Exclude targets matching `pattern`.
  pub fn exclude(mut self, pattern: TargetPattern) -> Self {
    self.rules.push(TargetRule::exclude(pattern));
    self
  }

  /// Re-include targets matching `pattern` over less specific exclusions.
  pub fn include(mut self, pattern: TargetPattern) -> Self {
    self.rules.push(TargetRule::include(pattern));
    self
  }

  /// Whether this project's own rules drop `target`.
  pub fn is_excluded_for(&self, target: &Target) -> bool {
    is_excluded(target, &self.rules)
  }

  /// Entries in effect for `target`: unconditional settings, then each
  /// matching conditional block in declaration order.
  pub fn effective_settings(&self, target: &Target) -> Vec<SettingEntry> {
    let mut entries = self.settings.entries().to_vec();
    for block in self.conditional.iter().filter(|c| c.when.matches(target)) {
      entries.extend_from_slice(block.settings.entries());
    }
    entries
  }

  /// Every pattern this descriptor mentions, for validation.
  pub(crate) fn patterns(&self) -> impl Iterator<Item = &TargetPattern> {
    self
      .conditional
      .iter()
      .map(|c| &c.when)
      .chain(self.rules.iter().map(|r| &r.pattern))
  }
}

/// Errors raised by the project store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
  /// Two descriptors share an id.
  #[error("duplicate project id '{id}'")]
  DuplicateProjectId { id: String },

  /// An id that cannot be used as a file name.
  #[error("project id '{id}' must be a non-empty file name without path separators or '..'")]
  InvalidProjectId { id: String },

  /// A project lists the same dependency more than once.
  #[error("project '{project}' lists dependency '{dependency}' more than once")]
  DuplicateDependency { project: String, dependency: String },

  /// A reference names a project that does not exist.
  #[error("unknown project '{id}'{}", .referenced_by.as_ref().map(|r| format!(" (referenced by '{}')", r)).unwrap_or_default())]
  UnknownProject { id: String, referenced_by: Option<String> },

  /// A rule or conditional block names an unknown axis or value.
  #[error("project '{project}' has an invalid target pattern: {source}")]
  InvalidPattern {
    project: String,
    #[source]
    source: AxisError,
  },
}
