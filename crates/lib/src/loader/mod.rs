//! Declaration file loading.
//!
//! A declaration is a JSON document listing axes, setting semantics, the
//! output layout, projects and the solution to generate:
//!
//! ```json
//! {
//!   "axes": [{ "name": "platform", "values": ["win64", "linux"] }],
//!   "settings": { "defines": "set" },
//!   "layout": { "output_path": "output/[target.platform]/[project.id]" },
//!   "projects": [{
//!     "id": "core", "kind": "static_lib",
//!     "public": { "include_paths": ["core/include"] },
//!     "when": [{ "target": { "platform": "win64" }, "private": { "defines": "WIN32" } }],
//!     "exclude": [{ "platform": "linux" }]
//!   }],
//!   "solution": { "name": "Demo", "projects": ["core"] }
//! }
//! ```
//!
//! Within one block, `public` entries come first, then `private`, then
//! `interface`; keys keep document order.

mod types;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::axis::{Axis, TargetPattern, TargetSelector};
use crate::consts::DECLARATION_VERSION;
use crate::context::{Context, ContextBuilder, ContextError};
use crate::project::ProjectDescriptor;
use crate::settings::{SettingBlock, Visibility};
use crate::solution::SolutionDecl;

pub use types::{AxisDecl, Declaration, LayoutDecl, OneOrMany, PatternMap, ProjectDecl, SettingMap, SolutionSpec, WhenDecl};

/// A loaded declaration: frozen context plus the solution to assemble.
#[derive(Debug, Clone)]
pub struct Loaded {
  pub context: Context,
  pub solution: SolutionDecl,
}

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {origin}: {source}")]
  Parse {
    origin: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("unsupported declaration version {0}, expected {DECLARATION_VERSION}")]
  UnsupportedVersion(u32),

  #[error("declaration has {} error(s)", .0.len())]
  Invalid(Vec<ContextError>),
}

impl LoadError {
  /// Short machine readable name of the failure class.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Read { .. } => "ReadError",
      Self::Parse { .. } => "ParseError",
      Self::UnsupportedVersion(_) => "UnsupportedVersion",
      Self::Invalid(_) => "InvalidDeclaration",
    }
  }
}

/// Read and load the declaration at `path`.
pub fn load(path: &Path) -> Result<Loaded, LoadError> {
  let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  info!(path = %path.display(), "loading declaration");
  load_str(&text, &path.display().to_string())
}

/// Load a declaration from JSON text. `origin` names the source in errors.
pub fn load_str(text: &str, origin: &str) -> Result<Loaded, LoadError> {
  let declaration: Declaration = serde_json::from_str(text).map_err(|source| LoadError::Parse {
    origin: origin.to_string(),
    source,
  })?;
  if declaration.version != DECLARATION_VERSION {
    return Err(LoadError::UnsupportedVersion(declaration.version));
  }
  declaration.into_loaded().map_err(LoadError::Invalid)
}

fn pattern(map: &PatternMap) -> TargetPattern {
  map
    .iter()
    .fold(TargetPattern::any(), |pattern, (axis, value)| pattern.pin(axis, value))
}

fn block(public: &SettingMap, private: &SettingMap, interface: &SettingMap) -> SettingBlock {
  let mut block = SettingBlock::new();
  for (map, visibility) in [
    (public, Visibility::Public),
    (private, Visibility::Private),
    (interface, Visibility::Interface),
  ] {
    for (key, values) in map.iter() {
      for value in values {
        block.push(key, value, visibility);
      }
    }
  }
  block
}

impl ProjectDecl {
  fn to_descriptor(&self) -> ProjectDescriptor {
    let mut descriptor = ProjectDescriptor::new(&self.id, self.kind)
      .with_settings(block(&self.public, &self.private, &self.interface));
    for when in &self.when {
      descriptor = descriptor.when(
        pattern(&when.target),
        block(&when.public, &when.private, &when.interface),
      );
    }
    for dep in &self.dependencies {
      descriptor = descriptor.depends_on(dep.as_str());
    }
    for rule in &self.exclude {
      descriptor = descriptor.exclude(pattern(rule));
    }
    for rule in &self.include {
      descriptor = descriptor.include(pattern(rule));
    }
    descriptor
  }
}

impl SolutionSpec {
  fn to_decl(&self) -> SolutionDecl {
    let mut decl = SolutionDecl::new(&self.name);
    for root in &self.projects {
      decl = decl.root(root.as_str());
    }
    for selector in &self.targets {
      let selector = selector
        .iter()
        .fold(TargetSelector::all(), |sel, (axis, values)| {
          sel.with(axis, values.clone().into_vec())
        });
      decl = decl.select(selector);
    }
    if let Some(file_name) = &self.file_name {
      decl = decl.file_name(file_name);
    }
    decl
  }
}

impl Declaration {
  /// Build and freeze the context, collecting every declaration error.
  pub fn into_loaded(self) -> Result<Loaded, Vec<ContextError>> {
    let mut builder = ContextBuilder::new();

    for axis in &self.axes {
      if let Err(err) = builder.register_axis(Axis::new(&axis.name, axis.values.iter().cloned())) {
        debug!(axis = %axis.name, error = %err, "axis rejected");
      }
    }
    for (key, semantics) in &self.settings {
      builder.set_key_semantics(key, *semantics);
    }
    if let Some(layout) = &self.layout.output_path {
      builder.set_output_layout(layout);
    }
    for project in &self.projects {
      if let Err(err) = builder.add_project(project.to_descriptor()) {
        debug!(project = %project.id, error = %err, "project rejected");
      }
    }

    let context = builder.freeze()?;
    Ok(Loaded {
      context,
      solution: self.solution.to_decl(),
    })
  }
}
