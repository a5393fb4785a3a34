//! Serde model of a declaration file.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::consts::DECLARATION_VERSION;
use crate::project::OutputKind;
use crate::settings::KeySemantics;

fn default_version() -> u32 {
  DECLARATION_VERSION
}

/// Top-level declaration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
  #[serde(default = "default_version")]
  pub version: u32,
  #[serde(default)]
  pub axes: Vec<AxisDecl>,
  /// Merge semantics overrides keyed by setting name.
  #[serde(default)]
  pub settings: BTreeMap<String, KeySemantics>,
  #[serde(default)]
  pub layout: LayoutDecl,
  #[serde(default)]
  pub projects: Vec<ProjectDecl>,
  pub solution: SolutionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisDecl {
  pub name: String,
  pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutDecl {
  pub output_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDecl {
  pub id: String,
  pub kind: OutputKind,
  #[serde(default)]
  pub public: SettingMap,
  #[serde(default)]
  pub private: SettingMap,
  #[serde(default)]
  pub interface: SettingMap,
  #[serde(default)]
  pub when: Vec<WhenDecl>,
  #[serde(default)]
  pub dependencies: Vec<String>,
  #[serde(default)]
  pub exclude: Vec<PatternMap>,
  #[serde(default)]
  pub include: Vec<PatternMap>,
}

/// A conditional settings block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhenDecl {
  pub target: PatternMap,
  #[serde(default)]
  pub public: SettingMap,
  #[serde(default)]
  pub private: SettingMap,
  #[serde(default)]
  pub interface: SettingMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolutionSpec {
  pub name: String,
  pub projects: Vec<String>,
  /// Selectors; empty selects every target.
  #[serde(default)]
  pub targets: Vec<BTreeMap<String, OneOrMany>>,
  pub file_name: Option<String>,
}

/// Axis pins of a pattern.
pub type PatternMap = BTreeMap<String, String>;

/// A single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

impl OneOrMany {
  pub fn into_vec(self) -> Vec<String> {
    match self {
      Self::One(value) => vec![value],
      Self::Many(values) => values,
    }
  }
}

/// Setting values keyed by setting name, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingMap(pub Vec<(String, Vec<String>)>);

impl SettingMap {
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
  }
}

impl<'de> Deserialize<'de> for SettingMap {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct SettingMapVisitor;

    impl<'de> Visitor<'de> for SettingMapVisitor {
      type Value = SettingMap;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of setting names to a string or a list of strings")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SettingMap, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, OneOrMany>()? {
          entries.push((key, value.into_vec()));
        }
        Ok(SettingMap(entries))
      }
    }

    deserializer.deserialize_map(SettingMapVisitor)
  }
}
