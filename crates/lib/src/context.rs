//! The generation context: every input a resolution run reads.
//!
//! [`ContextBuilder`] collects axes, projects and schema overrides while a
//! declaration is loaded. [`ContextBuilder::freeze`] validates the whole
//! declaration at once and yields an immutable [`Context`] that is shared by
//! reference across worker threads.

use thiserror::Error;
use tracing::{debug, info};

use crate::axis::{Axis, AxisError, AxisRegistry};
use crate::consts::DEFAULT_OUTPUT_LAYOUT;
use crate::project::{ProjectDescriptor, ProjectError, ProjectStore};
use crate::settings::{KeySemantics, SettingSchema};
use crate::template::{Template, TemplateError};

/// Any problem found while building or freezing a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  #[error(transparent)]
  Axis(#[from] AxisError),

  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error("invalid output layout '{layout}': {source}")]
  Layout {
    layout: String,
    #[source]
    source: TemplateError,
  },
}

impl ContextError {
  /// Short machine readable name of the failure class.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Axis(AxisError::DuplicateAxis { .. }) => "DuplicateAxis",
      Self::Axis(AxisError::DuplicateValue { .. }) => "DuplicateAxisValue",
      Self::Axis(_) => "InvalidAxis",
      Self::Project(ProjectError::DuplicateProjectId { .. }) => "DuplicateProjectId",
      Self::Project(ProjectError::InvalidProjectId { .. }) => "InvalidProjectId",
      Self::Project(ProjectError::DuplicateDependency { .. }) => "DuplicateDependency",
      Self::Project(ProjectError::UnknownProject { .. }) => "UnknownProject",
      Self::Project(ProjectError::InvalidPattern { .. }) => "InvalidPattern",
      Self::Layout { .. } => "InvalidLayout",
    }
  }
}

/// Mutable phase of a context.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
  axes: AxisRegistry,
  projects: ProjectStore,
  schema: SettingSchema,
  layout: String,
  errors: Vec<ContextError>,
}

impl Default for ContextBuilder {
  fn default() -> Self {
    Self {
      axes: AxisRegistry::new(),
      projects: ProjectStore::new(),
      schema: SettingSchema::default(),
      layout: DEFAULT_OUTPUT_LAYOUT.to_string(),
      errors: Vec::new(),
    }
  }
}

impl ContextBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an axis. Errors are also remembered and reported by `freeze`.
  pub fn register_axis(&mut self, axis: Axis) -> Result<(), ContextError> {
    self.axes.register(axis).map_err(|err| self.remember(err.into()))
  }

  /// Add a project. Errors are also remembered and reported by `freeze`.
  pub fn add_project(&mut self, descriptor: ProjectDescriptor) -> Result<usize, ContextError> {
    self.projects.add(descriptor).map_err(|err| self.remember(err.into()))
  }

  /// Override the merge semantics of a setting key.
  pub fn set_key_semantics(&mut self, key: impl Into<String>, semantics: KeySemantics) {
    self.schema.set(key, semantics);
  }

  /// Replace the output path layout template.
  pub fn set_output_layout(&mut self, layout: impl Into<String>) {
    self.layout = layout.into();
  }

  pub fn axes(&self) -> &AxisRegistry {
    &self.axes
  }

  pub fn projects(&self) -> &ProjectStore {
    &self.projects
  }

  fn remember(&mut self, err: ContextError) -> ContextError {
    self.errors.push(err.clone());
    err
  }

  /// Validate everything and produce the immutable context.
  ///
  /// # Errors
  ///
  /// Returns every registration error seen so far plus every dangling or
  /// repeated dependency, invalid pattern and layout problem. A layout must
  /// render a distinct path for every project and target.
  pub fn freeze(self) -> Result<Context, Vec<ContextError>> {
    let mut errors = self.errors;

    let dependencies = match self.projects.dependency_slots() {
      Ok(slots) => slots,
      Err(errs) => {
        errors.extend(errs.into_iter().map(ContextError::from));
        Vec::new()
      }
    };

    errors.extend(self.projects.validate_patterns(&self.axes).into_iter().map(ContextError::from));

    let layout = Template::parse(&self.layout).and_then(|t| {
      t.validate_axes(&self.axes)?;
      t.validate_output_layout(&self.axes)?;
      Ok(t)
    });
    let layout = match layout {
      Ok(layout) => Some(layout),
      Err(source) => {
        errors.push(ContextError::Layout {
          layout: self.layout.clone(),
          source,
        });
        None
      }
    };

    match layout {
      Some(layout) if errors.is_empty() => {
        info!(
          axes = self.axes.len(),
          projects = self.projects.len(),
          targets = self.axes.target_count(),
          "context frozen"
        );
        Ok(Context {
          axes: self.axes,
          projects: self.projects,
          schema: self.schema,
          layout,
          dependencies,
        })
      }
      _ => {
        debug!(errors = errors.len(), "context rejected");
        Err(errors)
      }
    }
  }
}

/// Immutable generation context.
#[derive(Debug, Clone)]
pub struct Context {
  axes: AxisRegistry,
  projects: ProjectStore,
  schema: SettingSchema,
  layout: Template,
  dependencies: Vec<Vec<usize>>,
}

impl Context {
  pub fn axes(&self) -> &AxisRegistry {
    &self.axes
  }

  pub fn projects(&self) -> &ProjectStore {
    &self.projects
  }

  pub fn schema(&self) -> &SettingSchema {
    &self.schema
  }

  /// Output path layout.
  pub fn layout(&self) -> &Template {
    &self.layout
  }

  /// Dependency slots of the project at `slot`, in declared order.
  pub fn dependencies_of(&self, slot: usize) -> &[usize] {
    self.dependencies.get(slot).map(Vec::as_slice).unwrap_or(&[])
  }
}
