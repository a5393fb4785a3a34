//! Arena of project descriptors addressed by integer slot.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::types::{ProjectDescriptor, ProjectError, ProjectRef};
use crate::axis::AxisRegistry;

/// Descriptors in declaration order, indexed by id.
///
/// A slot is the position a descriptor was added at. Slots are stable for the
/// lifetime of the store and double as graph node weights and tie breakers in
/// topological ordering.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
  projects: Vec<ProjectDescriptor>,
  index: HashMap<String, usize>,
}

impl ProjectStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a descriptor and return its slot.
  ///
  /// # Errors
  ///
  /// Returns `InvalidProjectId` if the id cannot name an output file and
  /// `DuplicateProjectId` if a descriptor with the same id exists.
  pub fn add(&mut self, descriptor: ProjectDescriptor) -> Result<usize, ProjectError> {
    if !is_valid_id(&descriptor.id) {
      return Err(ProjectError::InvalidProjectId { id: descriptor.id });
    }
    if self.index.contains_key(&descriptor.id) {
      return Err(ProjectError::DuplicateProjectId { id: descriptor.id });
    }

    let slot = self.projects.len();
    debug!(project = %descriptor.id, slot, kind = %descriptor.kind, "added project");
    self.index.insert(descriptor.id.clone(), slot);
    self.projects.push(descriptor);
    Ok(slot)
  }

  /// Descriptor at `slot`.
  pub fn get(&self, slot: usize) -> Option<&ProjectDescriptor> {
    self.projects.get(slot)
  }

  /// Descriptor with id `id`.
  pub fn by_id(&self, id: &str) -> Option<&ProjectDescriptor> {
    self.slot_of(id).and_then(|slot| self.get(slot))
  }

  pub fn slot_of(&self, id: &str) -> Option<usize> {
    self.index.get(id).copied()
  }

  /// Resolve a reference to a slot.
  ///
  /// `referenced_by` names the project holding the reference, when there is
  /// one, so the error can point at it.
  pub fn resolve_reference(&self, reference: &ProjectRef, referenced_by: Option<&str>) -> Result<usize, ProjectError> {
    self.slot_of(reference.id()).ok_or_else(|| ProjectError::UnknownProject {
      id: reference.id().to_string(),
      referenced_by: referenced_by.map(str::to_string),
    })
  }

  /// Descriptors in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &ProjectDescriptor> {
    self.projects.iter()
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// Resolve every dependency reference to slots, in declared order.
  ///
  /// # Errors
  ///
  /// Returns every dangling or repeated reference, not just the first.
  pub(crate) fn dependency_slots(&self) -> Result<Vec<Vec<usize>>, Vec<ProjectError>> {
    let mut slots = Vec::with_capacity(self.projects.len());
    let mut errors = Vec::new();

    for project in &self.projects {
      let mut deps = Vec::with_capacity(project.dependencies.len());
      let mut seen = HashSet::with_capacity(project.dependencies.len());
      for reference in &project.dependencies {
        if !seen.insert(reference.id()) {
          errors.push(ProjectError::DuplicateDependency {
            project: project.id.clone(),
            dependency: reference.id().to_string(),
          });
          continue;
        }
        match self.resolve_reference(reference, Some(&project.id)) {
          Ok(slot) => deps.push(slot),
          Err(err) => errors.push(err),
        }
      }
      slots.push(deps);
    }

    if errors.is_empty() { Ok(slots) } else { Err(errors) }
  }

  /// Check every rule and conditional pattern against `axes`.
  pub(crate) fn validate_patterns(&self, axes: &AxisRegistry) -> Vec<ProjectError> {
    self
      .projects
      .iter()
      .flat_map(|project| {
        project.patterns().filter_map(|pattern| {
          axes
            .validate_pattern(pattern)
            .err()
            .map(|source| ProjectError::InvalidPattern {
              project: project.id.clone(),
              source,
            })
        })
      })
      .collect()
  }
}

/// Ids become file names, so they must stay a single path component.
fn is_valid_id(id: &str) -> bool {
  !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::axis::{Axis, AxisError, TargetPattern};
  use crate::project::OutputKind;

  fn store() -> ProjectStore {
    let mut store = ProjectStore::new();
    store.add(ProjectDescriptor::new("core", OutputKind::StaticLib)).unwrap();
    store
      .add(ProjectDescriptor::new("app", OutputKind::Executable).depends_on("core"))
      .unwrap();
    store
  }

  #[test]
  fn slots_follow_declaration_order() {
    let store = store();
    assert_eq!(store.slot_of("core"), Some(0));
    assert_eq!(store.slot_of("app"), Some(1));
    assert_eq!(store.by_id("app").map(|p| p.kind), Some(OutputKind::Executable));
    assert_eq!(store.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["core", "app"]);
  }

  #[test]
  fn duplicate_id_rejected() {
    let mut store = store();
    let err = store.add(ProjectDescriptor::new("core", OutputKind::DynamicLib)).unwrap_err();
    assert_eq!(err, ProjectError::DuplicateProjectId { id: "core".into() });
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn ids_that_are_not_file_names_rejected() {
    let mut store = ProjectStore::new();
    for id in ["", ".", "..", "../escaped", "a/b", "a\\b"] {
      let err = store.add(ProjectDescriptor::new(id, OutputKind::StaticLib)).unwrap_err();
      assert_eq!(err, ProjectError::InvalidProjectId { id: id.into() });
    }
    assert!(store.is_empty());
    assert!(store.add(ProjectDescriptor::new("core.v2", OutputKind::StaticLib)).is_ok());
  }

  #[test]
  fn resolve_reference_reports_referrer() {
    let store = store();
    assert_eq!(store.resolve_reference(&"core".into(), None), Ok(0));

    let err = store.resolve_reference(&"zlib".into(), Some("app")).unwrap_err();
    assert_eq!(
      err,
      ProjectError::UnknownProject {
        id: "zlib".into(),
        referenced_by: Some("app".into()),
      }
    );
  }

  #[test]
  fn dependency_slots_collect_every_dangling_reference() {
    let mut store = store();
    store
      .add(
        ProjectDescriptor::new("tools", OutputKind::Executable)
          .depends_on("zlib")
          .depends_on("core")
          .depends_on("png"),
      )
      .unwrap();

    let errors = store.dependency_slots().unwrap_err();
    let ids: Vec<_> = errors
      .iter()
      .map(|e| match e {
        ProjectError::UnknownProject { id, .. } => id.as_str(),
        other => panic!("unexpected error: {other}"),
      })
      .collect();
    assert_eq!(ids, vec!["zlib", "png"]);
  }

  #[test]
  fn repeated_dependency_rejected() {
    let mut store = store();
    store
      .add(
        ProjectDescriptor::new("tools", OutputKind::Executable)
          .depends_on("core")
          .depends_on("app")
          .depends_on("core"),
      )
      .unwrap();

    let errors = store.dependency_slots().unwrap_err();
    assert_eq!(
      errors,
      vec![ProjectError::DuplicateDependency {
        project: "tools".into(),
        dependency: "core".into(),
      }]
    );
  }

  #[test]
  fn dependency_slots_in_declared_order() {
    let mut store = store();
    store.add(ProjectDescriptor::new("util", OutputKind::StaticLib)).unwrap();
    store
      .add(
        ProjectDescriptor::new("editor", OutputKind::Executable)
          .depends_on("util")
          .depends_on("core"),
      )
      .unwrap();

    let slots = store.dependency_slots().unwrap();
    assert_eq!(slots, vec![vec![], vec![0], vec![], vec![2, 0]]);
  }

  #[test]
  fn invalid_patterns_are_reported_per_project() {
    let mut axes = AxisRegistry::new();
    axes.register(Axis::new("mode", ["debug", "release"])).unwrap();

    let mut store = ProjectStore::new();
    store
      .add(ProjectDescriptor::new("core", OutputKind::StaticLib).exclude(TargetPattern::any().pin("arch", "x86")))
      .unwrap();
    store
      .add(ProjectDescriptor::new("app", OutputKind::Executable).exclude(TargetPattern::any().pin("mode", "debug")))
      .unwrap();

    let errors = store.validate_patterns(&axes);
    assert_eq!(
      errors,
      vec![ProjectError::InvalidPattern {
        project: "core".into(),
        source: AxisError::UnknownAxis { axis: "arch".into() },
      }]
    );
  }
}
