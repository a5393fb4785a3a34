//! Axis, target and target-pattern types.
//!
//! An [`Axis`] is one independent dimension of build variation (platform,
//! toolchain, optimization). A [`Target`] pins exactly one value per axis, in
//! registration order. Patterns and selectors describe subsets of the target
//! space without enumerating it.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::consts::TARGET_LABEL_SEPARATOR;

/// One dimension of build variation with its ordered value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
  /// Axis name, unique within a registry.
  pub name: String,
  /// Allowed values in declaration order.
  pub values: Vec<String>,
}

impl Axis {
  /// Create an axis from a name and its values.
  pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      name: name.into(),
      values: values.into_iter().map(Into::into).collect(),
    }
  }

  /// Position of `value` within this axis.
  pub fn position(&self, value: &str) -> Option<usize> {
    self.values.iter().position(|v| v == value)
  }
}

/// One concrete combination of axis values.
///
/// Values are stored as `(axis, value)` pairs in registry order. The derived
/// `Ord` compares those strings lexicographically, not by value position, so
/// sorting targets does not reproduce enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
  values: Vec<(String, String)>,
}

impl Target {
  pub(crate) fn from_pairs(values: Vec<(String, String)>) -> Self {
    Self { values }
  }

  /// The value selected for `axis`, if the axis exists.
  pub fn get(&self, axis: &str) -> Option<&str> {
    self
      .values
      .iter()
      .find(|(name, _)| name == axis)
      .map(|(_, value)| value.as_str())
  }

  /// All `(axis, value)` pairs in registry order.
  pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(a, v)| (a.as_str(), v.as_str()))
  }

  /// Selected values in registry order.
  pub fn values(&self) -> impl Iterator<Item = &str> {
    self.values.iter().map(|(_, v)| v.as_str())
  }

  /// Number of axes in this target.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// True for a target over zero axes.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Human readable label, e.g. `win64|vs2019|debug`.
  pub fn label(&self) -> String {
    self.label_with(TARGET_LABEL_SEPARATOR)
  }

  /// Label joined with an arbitrary separator.
  pub fn label_with(&self, separator: &str) -> String {
    self.values().collect::<Vec<_>>().join(separator)
  }
}

impl std::fmt::Display for Target {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

impl Serialize for Target {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.values.len()))?;
    for (axis, value) in &self.values {
      map.serialize_entry(axis, value)?;
    }
    map.end()
  }
}

/// A partial target tuple: every unpinned axis is a wildcard.
///
/// Specificity is the number of pinned axes. A pattern pinning every axis is
/// an exact target match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TargetPattern {
  pins: Vec<(String, String)>,
}

impl TargetPattern {
  /// Pattern matching every target.
  pub fn any() -> Self {
    Self::default()
  }

  /// Pin `axis` to `value`, replacing any earlier pin on the same axis.
  pub fn pin(mut self, axis: impl Into<String>, value: impl Into<String>) -> Self {
    let axis = axis.into();
    let value = value.into();
    match self.pins.iter_mut().find(|(a, _)| *a == axis) {
      Some(slot) => slot.1 = value,
      None => self.pins.push((axis, value)),
    }
    self
  }

  /// Pinned `(axis, value)` pairs.
  pub fn pins(&self) -> impl Iterator<Item = (&str, &str)> {
    self.pins.iter().map(|(a, v)| (a.as_str(), v.as_str()))
  }

  /// Number of pinned axes.
  pub fn specificity(&self) -> usize {
    self.pins.len()
  }

  /// Whether every pin agrees with `target`.
  pub fn matches(&self, target: &Target) -> bool {
    self.pins.iter().all(|(axis, value)| target.get(axis) == Some(value.as_str()))
  }
}

impl<K, V> FromIterator<(K, V)> for TargetPattern
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    iter.into_iter().fold(Self::any(), |p, (k, v)| p.pin(k, v))
  }
}

impl std::fmt::Display for TargetPattern {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.pins.is_empty() {
      return write!(f, "*");
    }
    let parts: Vec<String> = self.pins.iter().map(|(a, v)| format!("{}={}", a, v)).collect();
    write!(f, "{}", parts.join(","))
  }
}

/// What a matching [`TargetRule`] does to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
  /// Remove the target.
  Exclude,
  /// Keep the target even if a less specific rule excludes it.
  Include,
}

/// A per-project exclusion or inclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRule {
  pub pattern: TargetPattern,
  pub action: RuleAction,
}

impl TargetRule {
  pub fn exclude(pattern: TargetPattern) -> Self {
    Self {
      pattern,
      action: RuleAction::Exclude,
    }
  }

  pub fn include(pattern: TargetPattern) -> Self {
    Self {
      pattern,
      action: RuleAction::Include,
    }
  }
}

/// Selects a subset of targets by listing accepted values per axis.
///
/// Axes not mentioned accept every value. This mirrors flag unions such as
/// `Optimization.Debug | Optimization.Release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelector {
  choices: Vec<(String, Vec<String>)>,
}

impl TargetSelector {
  /// Selector accepting every target.
  pub fn all() -> Self {
    Self::default()
  }

  /// Restrict `axis` to `values`.
  pub fn with<I, S>(mut self, axis: impl Into<String>, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.choices.push((axis.into(), values.into_iter().map(Into::into).collect()));
    self
  }

  /// Per-axis accepted values.
  pub fn choices(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.choices.iter().map(|(a, v)| (a.as_str(), v.as_slice()))
  }

  /// Whether `target` satisfies every restricted axis.
  pub fn matches(&self, target: &Target) -> bool {
    self.choices.iter().all(|(axis, values)| {
      target
        .get(axis)
        .map(|selected| values.iter().any(|v| v == selected))
        .unwrap_or(false)
    })
  }
}

/// Errors raised while registering axes or validating patterns against them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxisError {
  /// An axis with this name is already registered.
  #[error("duplicate axis '{name}'")]
  DuplicateAxis { name: String },

  /// A value is listed twice within one axis.
  #[error("axis '{axis}' lists value '{value}' more than once")]
  DuplicateValue { axis: String, value: String },

  /// A pattern or selector names an axis that is not registered.
  #[error("unknown axis '{axis}'")]
  UnknownAxis { axis: String },

  /// A pattern or selector names a value the axis does not declare.
  #[error("axis '{axis}' has no value '{value}'")]
  UnknownValue { axis: String, value: String },

  /// A full tuple was requested with the wrong number of values.
  #[error("target needs {expected} value(s), got {actual}")]
  IncompleteTarget { expected: usize, actual: usize },
}
