//! Setting entries, propagation tags and merge semantics.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::consts::{DEFAULT_SET_KEYS, DEFAULT_SINGULAR_KEYS};

/// How far a setting travels along the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  /// Applied to the declaring project only.
  Private,
  /// Applied to the declaring project and every direct or transitive dependent.
  Public,
  /// Applied to direct dependents only, never to the declaring project.
  Interface,
}

impl Visibility {
  /// Whether the declaring project itself sees the setting.
  pub fn applies_to_self(self) -> bool {
    matches!(self, Self::Private | Self::Public)
  }

  /// Whether dependents see the setting at all.
  pub fn is_exported(self) -> bool {
    matches!(self, Self::Public | Self::Interface)
  }
}

impl std::fmt::Display for Visibility {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Private => write!(f, "private"),
      Self::Public => write!(f, "public"),
      Self::Interface => write!(f, "interface"),
    }
  }
}

/// A single tagged setting value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingEntry {
  pub key: String,
  pub value: String,
  pub visibility: Visibility,
}

/// Ordered list of tagged settings declared by one project.
///
/// Order is declaration order and is preserved all the way into emitted
/// files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingBlock {
  entries: Vec<SettingEntry>,
}

impl SettingBlock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append an entry.
  pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>, visibility: Visibility) {
    self.entries.push(SettingEntry {
      key: key.into(),
      value: value.into(),
      visibility,
    });
  }

  /// Builder form of [`push`](Self::push) with `Private` visibility.
  pub fn private(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.push(key, value, Visibility::Private);
    self
  }

  /// Builder form of [`push`](Self::push) with `Public` visibility.
  pub fn public(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.push(key, value, Visibility::Public);
    self
  }

  /// Builder form of [`push`](Self::push) with `Interface` visibility.
  pub fn interface(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.push(key, value, Visibility::Interface);
    self
  }

  pub fn entries(&self) -> &[SettingEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Extend<SettingEntry> for SettingBlock {
  fn extend<T: IntoIterator<Item = SettingEntry>>(&mut self, iter: T) {
    self.entries.extend(iter);
  }
}

/// How repeated values for one key combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySemantics {
  /// Concatenate in first-declared order, duplicates kept.
  List,
  /// Concatenate in first-declared order, later identical values dropped.
  Set,
  /// Exactly one value. Local declarations override inherited ones; two
  /// different inherited values are a conflict.
  Singular,
}

/// Per-key merge semantics, with defaults for well-known keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingSchema {
  keys: BTreeMap<String, KeySemantics>,
}

impl Default for SettingSchema {
  fn default() -> Self {
    let mut keys = BTreeMap::new();
    for key in DEFAULT_SET_KEYS {
      keys.insert(key.to_string(), KeySemantics::Set);
    }
    for key in DEFAULT_SINGULAR_KEYS {
      keys.insert(key.to_string(), KeySemantics::Singular);
    }
    Self { keys }
  }
}

impl SettingSchema {
  /// Override the semantics of `key`.
  pub fn set(&mut self, key: impl Into<String>, semantics: KeySemantics) {
    self.keys.insert(key.into(), semantics);
  }

  /// Semantics for `key`; unknown keys are lists.
  pub fn semantics(&self, key: &str) -> KeySemantics {
    self.keys.get(key).copied().unwrap_or(KeySemantics::List)
  }
}

/// Fully flattened settings of one resolved configuration.
///
/// Keys appear in the order they were first contributed; values keep merge
/// order. No propagation tags remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSettings {
  entries: Vec<(String, Vec<String>)>,
}

impl MergedSettings {
  pub(crate) fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
    Self { entries }
  }

  /// Values for `key`, if any were merged.
  pub fn get(&self, key: &str) -> Option<&[String]> {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, values)| values.as_slice())
  }

  /// Whether `key` carries `value`.
  pub fn contains(&self, key: &str, value: &str) -> bool {
    self.get(key).is_some_and(|values| values.iter().any(|v| v == value))
  }

  /// Iterate `(key, values)` in merge order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Serialize for MergedSettings {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (key, values) in &self.entries {
      map.serialize_entry(key, values)?;
    }
    map.end()
  }
}
