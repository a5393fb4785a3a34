//! Setting propagation fold.
//!
//! Two pure functions drive propagation:
//! - [`exports`] computes what a project hands to its dependents, given what
//!   its own dependencies exported.
//! - [`merge`] flattens a project's own entries plus everything its direct
//!   dependencies exported into [`MergedSettings`].
//!
//! Public entries travel along the whole chain. Interface entries travel one
//! hop: a dependent receives them but never re-exports them. Every exported
//! value remembers the entry it came from, so a value reaching a project over
//! two paths (a diamond) is folded once.

use std::collections::{HashMap, HashSet};

use super::types::{KeySemantics, MergedSettings, SettingEntry, SettingSchema, Visibility};

/// Identity of a declared entry: the declaring project's slot and the entry's
/// position within that project's effective settings for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettingOrigin {
  pub slot: usize,
  pub position: usize,
}

/// A setting value on its way to dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedSetting {
  pub key: String,
  pub value: String,
  /// Id of the declaring project.
  pub source: String,
  pub origin: SettingOrigin,
  /// `Public` values keep travelling; `Interface` values stop after one hop.
  pub transitive: bool,
}

/// A singular key that received different values from different dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingConflict {
  pub key: String,
  /// `(value, declaring project)` pairs in merge order.
  pub candidates: Vec<(String, String)>,
}

/// Compute the settings `project` exports to its dependents.
///
/// `own` is the project's effective entry list for the current target and
/// `dependency_exports` holds each direct dependency's exports in declared
/// order.
pub fn exports<'a>(
  slot: usize,
  project: &str,
  own: &[SettingEntry],
  dependency_exports: impl IntoIterator<Item = &'a [ExportedSetting]>,
) -> Vec<ExportedSetting> {
  let mut out = Vec::new();
  let mut seen = HashSet::new();

  for (position, entry) in own.iter().enumerate() {
    if !entry.visibility.is_exported() {
      continue;
    }
    let origin = SettingOrigin { slot, position };
    seen.insert(origin);
    out.push(ExportedSetting {
      key: entry.key.clone(),
      value: entry.value.clone(),
      source: project.to_string(),
      origin,
      transitive: entry.visibility == Visibility::Public,
    });
  }

  for dep in dependency_exports {
    for setting in dep.iter().filter(|s| s.transitive) {
      if seen.insert(setting.origin) {
        out.push(setting.clone());
      }
    }
  }

  out
}

/// Flatten `own` entries and inherited exports into merged settings.
///
/// Own `Private` and `Public` entries come first, in declaration order, then
/// each dependency's exports in declared dependency order.
///
/// # Errors
///
/// Returns every singular key whose inherited candidates disagree and that
/// the project does not set itself.
pub fn merge<'a>(
  schema: &SettingSchema,
  own: &[SettingEntry],
  dependency_exports: impl IntoIterator<Item = &'a [ExportedSetting]>,
) -> Result<MergedSettings, Vec<SettingConflict>> {
  let mut acc = Accumulator::new(schema);

  for entry in own.iter().filter(|e| e.visibility.applies_to_self()) {
    acc.add_local(&entry.key, &entry.value);
  }

  let mut seen = HashSet::new();
  for dep in dependency_exports {
    for setting in dep {
      if seen.insert(setting.origin) {
        acc.add_inherited(&setting.key, &setting.value, &setting.source);
      }
    }
  }

  acc.finish()
}

#[derive(Default)]
struct SingularSlot {
  local: Option<String>,
  inherited: Vec<(String, String)>,
}

struct Accumulator<'s> {
  schema: &'s SettingSchema,
  order: Vec<String>,
  lists: HashMap<String, Vec<String>>,
  singulars: HashMap<String, SingularSlot>,
}

impl<'s> Accumulator<'s> {
  fn new(schema: &'s SettingSchema) -> Self {
    Self {
      schema,
      order: Vec::new(),
      lists: HashMap::new(),
      singulars: HashMap::new(),
    }
  }

  fn touch(&mut self, key: &str) {
    if !self.lists.contains_key(key) && !self.singulars.contains_key(key) {
      self.order.push(key.to_string());
    }
  }

  fn add_local(&mut self, key: &str, value: &str) {
    self.touch(key);
    match self.schema.semantics(key) {
      KeySemantics::Singular => {
        // Later local declarations (e.g. target-conditional blocks) override earlier ones.
        self.singulars.entry(key.to_string()).or_default().local = Some(value.to_string());
      }
      semantics => self.push_list(key, value, semantics),
    }
  }

  fn add_inherited(&mut self, key: &str, value: &str, source: &str) {
    self.touch(key);
    match self.schema.semantics(key) {
      KeySemantics::Singular => {
        self
          .singulars
          .entry(key.to_string())
          .or_default()
          .inherited
          .push((value.to_string(), source.to_string()));
      }
      semantics => self.push_list(key, value, semantics),
    }
  }

  fn push_list(&mut self, key: &str, value: &str, semantics: KeySemantics) {
    let values = self.lists.entry(key.to_string()).or_default();
    if semantics == KeySemantics::Set && values.iter().any(|v| v == value) {
      return;
    }
    values.push(value.to_string());
  }

  fn finish(mut self) -> Result<MergedSettings, Vec<SettingConflict>> {
    let mut entries = Vec::with_capacity(self.order.len());
    let mut conflicts = Vec::new();

    for key in self.order {
      if let Some(values) = self.lists.remove(&key) {
        entries.push((key, values));
        continue;
      }

      let Some(slot) = self.singulars.remove(&key) else {
        continue;
      };

      if let Some(local) = slot.local {
        entries.push((key, vec![local]));
        continue;
      }

      let first = slot.inherited[0].0.clone();
      if slot.inherited.iter().all(|(value, _)| *value == first) {
        entries.push((key, vec![first]));
      } else {
        conflicts.push(SettingConflict {
          key,
          candidates: slot.inherited,
        });
      }
    }

    if conflicts.is_empty() {
      Ok(MergedSettings::from_entries(entries))
    } else {
      Err(conflicts)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::SettingBlock;

  fn schema() -> SettingSchema {
    SettingSchema::default()
  }

  fn none() -> Vec<&'static [ExportedSetting]> {
    Vec::new()
  }

  #[test]
  fn own_private_and_public_apply_interface_does_not() {
    let block = SettingBlock::new()
      .private("defines", "PRIV")
      .public("defines", "PUB")
      .interface("defines", "IFACE");

    let merged = merge(&schema(), block.entries(), none()).unwrap();
    assert_eq!(merged.get("defines").unwrap(), &["PRIV".to_string(), "PUB".to_string()]);
  }

  #[test]
  fn exports_skip_private() {
    let block = SettingBlock::new()
      .private("defines", "PRIV")
      .public("defines", "PUB")
      .interface("defines", "IFACE");

    let out = exports(0, "core", block.entries(), none());
    let values: Vec<_> = out.iter().map(|s| (s.value.as_str(), s.transitive)).collect();
    assert_eq!(values, vec![("PUB", true), ("IFACE", false)]);
    assert!(out.iter().all(|s| s.source == "core"));
  }

  #[test]
  fn public_travels_interface_stops_after_one_hop() {
    // c <- b <- a
    let c = SettingBlock::new().public("include_paths", "c/pub").interface("include_paths", "c/iface");
    let c_exports = exports(0, "c", c.entries(), none());

    let b = SettingBlock::new().interface("include_paths", "b/iface");
    let b_merged = merge(&schema(), b.entries(), [c_exports.as_slice()]).unwrap();
    assert_eq!(
      b_merged.get("include_paths").unwrap(),
      &["c/pub".to_string(), "c/iface".to_string()]
    );

    let b_exports = exports(1, "b", b.entries(), [c_exports.as_slice()]);
    let a_merged = merge(&schema(), &[], [b_exports.as_slice()]).unwrap();
    assert_eq!(
      a_merged.get("include_paths").unwrap(),
      &["b/iface".to_string(), "c/pub".to_string()]
    );
  }

  #[test]
  fn diamond_values_fold_once() {
    // d <- b, d <- c, {b, c} <- a
    let d = SettingBlock::new().public("include_paths", "d/include");
    let d_exports = exports(0, "d", d.entries(), none());
    let b_exports = exports(1, "b", &[], [d_exports.as_slice()]);
    let c_exports = exports(2, "c", &[], [d_exports.as_slice()]);

    let merged = merge(&schema(), &[], [b_exports.as_slice(), c_exports.as_slice()]).unwrap();
    assert_eq!(merged.get("include_paths").unwrap(), &["d/include".to_string()]);
  }

  #[test]
  fn list_keeps_duplicates_from_distinct_declarations() {
    let a = SettingBlock::new().public("libraries", "m");
    let b = SettingBlock::new().public("libraries", "m");
    let a_exports = exports(0, "a", a.entries(), none());
    let b_exports = exports(1, "b", b.entries(), none());

    let merged = merge(&schema(), &[], [a_exports.as_slice(), b_exports.as_slice()]).unwrap();
    assert_eq!(merged.get("libraries").unwrap().len(), 2);
  }

  #[test]
  fn set_drops_later_duplicates() {
    let a = SettingBlock::new().public("defines", "WIN32").public("defines", "A");
    let a_exports = exports(0, "a", a.entries(), none());
    let own = SettingBlock::new().private("defines", "A").private("defines", "B");

    let merged = merge(&schema(), own.entries(), [a_exports.as_slice()]).unwrap();
    assert_eq!(
      merged.get("defines").unwrap(),
      &["A".to_string(), "B".to_string(), "WIN32".to_string()]
    );
  }

  #[test]
  fn singular_local_overrides_inherited() {
    let dep = SettingBlock::new().public("output_name", "dep");
    let dep_exports = exports(0, "dep", dep.entries(), none());
    let own = SettingBlock::new().private("output_name", "base").private("output_name", "final");

    let merged = merge(&schema(), own.entries(), [dep_exports.as_slice()]).unwrap();
    assert_eq!(merged.get("output_name").unwrap(), &["final".to_string()]);
  }

  #[test]
  fn singular_agreeing_siblings_are_fine() {
    let a = SettingBlock::new().public("subsystem", "console");
    let b = SettingBlock::new().public("subsystem", "console");
    let a_exports = exports(0, "a", a.entries(), none());
    let b_exports = exports(1, "b", b.entries(), none());

    let merged = merge(&schema(), &[], [a_exports.as_slice(), b_exports.as_slice()]).unwrap();
    assert_eq!(merged.get("subsystem").unwrap(), &["console".to_string()]);
  }

  #[test]
  fn singular_conflicting_siblings_are_reported() {
    let a = SettingBlock::new().public("subsystem", "console");
    let b = SettingBlock::new().public("subsystem", "windows");
    let a_exports = exports(0, "a", a.entries(), none());
    let b_exports = exports(1, "b", b.entries(), none());

    let conflicts = merge(&schema(), &[], [a_exports.as_slice(), b_exports.as_slice()]).unwrap_err();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].key, "subsystem");
    assert_eq!(
      conflicts[0].candidates,
      vec![
        ("console".to_string(), "a".to_string()),
        ("windows".to_string(), "b".to_string())
      ]
    );
  }

  #[test]
  fn keys_keep_first_contribution_order() {
    let dep = SettingBlock::new().public("libraries", "core.lib").public("defines", "CORE");
    let dep_exports = exports(0, "core", dep.entries(), none());
    let own = SettingBlock::new().private("defines", "APP");

    let merged = merge(&schema(), own.entries(), [dep_exports.as_slice()]).unwrap();
    assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["defines", "libraries"]);
  }
}
