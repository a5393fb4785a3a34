//! Resolution results and errors.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::axis::Target;
use crate::project::OutputKind;
use crate::settings::MergedSettings;
use crate::template::TemplateError;

/// The fully merged configuration of one project for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfiguration {
  pub project_id: String,
  pub kind: OutputKind,
  pub target: Target,
  /// Merged settings with no propagation tags left.
  pub merged: MergedSettings,
  /// Rendered output path, relative to the output root.
  pub output_path: String,
  /// Direct dependencies in declared order.
  pub dependencies: Vec<String>,
}

/// Every configuration resolved for one target, in topological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
  target: Target,
  configurations: Vec<ResolvedConfiguration>,
  index: HashMap<String, usize>,
  excluded: Vec<String>,
}

impl TargetResolution {
  pub(crate) fn new(target: Target, configurations: Vec<ResolvedConfiguration>, excluded: Vec<String>) -> Self {
    let index = configurations
      .iter()
      .enumerate()
      .map(|(i, c)| (c.project_id.clone(), i))
      .collect();
    Self {
      target,
      configurations,
      index,
      excluded,
    }
  }

  pub fn target(&self) -> &Target {
    &self.target
  }

  /// Configuration of project `id`, if it is part of this target.
  pub fn get(&self, id: &str) -> Option<&ResolvedConfiguration> {
    self.index.get(id).map(|&i| &self.configurations[i])
  }

  pub fn contains(&self, id: &str) -> bool {
    self.index.contains_key(id)
  }

  /// Configurations with every dependency before its dependents.
  pub fn iter(&self) -> impl Iterator<Item = &ResolvedConfiguration> {
    self.configurations.iter()
  }

  /// Project ids dropped for this target, in declaration order.
  pub fn excluded(&self) -> &[String] {
    &self.excluded
  }

  pub fn len(&self) -> usize {
    self.configurations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configurations.is_empty()
  }
}

/// Why a set of output kinds cannot link together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkageConflict {
  /// `dependent` lists an executable as a dependency.
  DependsOnExecutable { dependent: String, executable: String },
  /// A static library is absorbed by more than one link unit of one executable.
  LinkedTwice {
    executable: String,
    library: String,
    units: Vec<String>,
  },
}

impl std::fmt::Display for LinkageConflict {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::DependsOnExecutable { dependent, executable } => {
        write!(f, "'{}' depends on executable '{}'", dependent, executable)
      }
      Self::LinkedTwice {
        executable,
        library,
        units,
      } => write!(
        f,
        "static library '{}' is linked into '{}' more than once (via {})",
        library,
        executable,
        units.join(", ")
      ),
    }
  }
}

/// Errors raised while resolving one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ResolveError {
  /// The dependency graph has a cycle. The first id is not repeated.
  #[error("dependency cycle: {}", format_cycle(.cycle))]
  CyclicDependency { cycle: Vec<String> },

  #[error("conflicting output kinds: {0}")]
  ConflictingOutputKind(LinkageConflict),

  /// Dependencies hand a singular key different values.
  #[error("project '{project}' inherits conflicting values for '{key}': {}", format_candidates(.candidates))]
  ConflictingSetting {
    project: String,
    key: String,
    candidates: Vec<(String, String)>,
  },

  #[error("cannot render output path for '{project}': {source}")]
  OutputPath {
    project: String,
    #[source]
    source: TemplateError,
  },
}

fn format_cycle(cycle: &[String]) -> String {
  let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
  if let Some(first) = cycle.first() {
    parts.push(first);
  }
  parts.join(" -> ")
}

fn format_candidates(candidates: &[(String, String)]) -> String {
  candidates
    .iter()
    .map(|(value, source)| format!("'{}' from '{}'", value, source))
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cycle_message_closes_the_loop() {
    let err = ResolveError::CyclicDependency {
      cycle: vec!["A".into(), "B".into()],
    };
    assert_eq!(err.to_string(), "dependency cycle: A -> B -> A");
  }

  #[test]
  fn setting_conflict_message_lists_candidates() {
    let err = ResolveError::ConflictingSetting {
      project: "app".into(),
      key: "subsystem".into(),
      candidates: vec![("console".into(), "a".into()), ("windows".into(), "b".into())],
    };
    assert_eq!(
      err.to_string(),
      "project 'app' inherits conflicting values for 'subsystem': 'console' from 'a', 'windows' from 'b'"
    );
  }
}
