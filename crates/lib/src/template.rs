//! Bracket placeholder templates for output paths and file names.
//!
//! Templates are plain strings with `[scope.field]` placeholders:
//!
//! - `[solution.name]` - the solution name
//! - `[project.id]` - the project id
//! - `[project.kind]` - the project output kind (`static_lib`, ...)
//! - `[target.<axis>]` - the value the target selects on `<axis>`
//! - `[target.all]` - every target value joined by `_`
//!
//! # Escaping
//!
//! `[[` produces a literal `[`. A lone `]` is literal.
//!
//! # Example
//!
//! ```
//! use slngen_lib::template::{Placeholder, Segment, Template};
//!
//! let template = Template::parse("bin/[target.platform]/[project.id]").unwrap();
//! assert_eq!(template.segments()[1], Segment::Placeholder(Placeholder::TargetAxis("platform".into())));
//! ```

use thiserror::Error;

use crate::axis::{AxisRegistry, Target};
use crate::consts::TARGET_PATH_SEPARATOR;
use crate::project::OutputKind;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `[solution.name]`
  SolutionName,
  /// `[project.id]`
  ProjectId,
  /// `[project.kind]`
  ProjectKind,
  /// `[target.<axis>]`
  TargetAxis(String),
  /// `[target.all]`
  TargetAll,
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum TemplateError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder scope: {0}")]
  UnknownScope(String),

  #[error("unknown placeholder field '{field}' in scope '{scope}'")]
  UnknownField { scope: String, field: String },

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("placeholder names unknown axis '{0}'")]
  UnknownAxis(String),

  #[error("no value for placeholder [{0}] in this context")]
  Unresolved(String),

  #[error("output layout must contain [project.id]")]
  MissingProjectId,

  #[error("output layout does not pin axis '{0}'; use [target.{0}] or [target.all]")]
  UnpinnedAxis(String),
}

/// Supplies placeholder values during rendering.
pub trait Resolver {
  fn resolve_solution_name(&self) -> Result<&str, TemplateError>;

  fn resolve_project_id(&self) -> Result<&str, TemplateError>;

  fn resolve_project_kind(&self) -> Result<OutputKind, TemplateError>;

  fn resolve_target(&self) -> Result<&Target, TemplateError>;
}

/// The values available while rendering one template.
///
/// Any field left `None` makes placeholders from that scope fail with
/// `Unresolved`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
  pub solution: Option<&'a str>,
  pub project: Option<(&'a str, OutputKind)>,
  pub target: Option<&'a Target>,
}

impl<'a> Scope<'a> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn solution(mut self, name: &'a str) -> Self {
    self.solution = Some(name);
    self
  }

  pub fn project(mut self, id: &'a str, kind: OutputKind) -> Self {
    self.project = Some((id, kind));
    self
  }

  pub fn target(mut self, target: &'a Target) -> Self {
    self.target = Some(target);
    self
  }
}

impl Resolver for Scope<'_> {
  fn resolve_solution_name(&self) -> Result<&str, TemplateError> {
    self.solution.ok_or_else(|| TemplateError::Unresolved("solution.name".into()))
  }

  fn resolve_project_id(&self) -> Result<&str, TemplateError> {
    self
      .project
      .map(|(id, _)| id)
      .ok_or_else(|| TemplateError::Unresolved("project.id".into()))
  }

  fn resolve_project_kind(&self) -> Result<OutputKind, TemplateError> {
    self
      .project
      .map(|(_, kind)| kind)
      .ok_or_else(|| TemplateError::Unresolved("project.kind".into()))
  }

  fn resolve_target(&self) -> Result<&Target, TemplateError> {
    self.target.ok_or_else(|| TemplateError::Unresolved("target".into()))
  }
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  source: String,
  segments: Vec<Segment>,
}

impl Template {
  /// Parse `source` into segments.
  ///
  /// # Errors
  ///
  /// Returns an error for unclosed, malformed or unknown placeholders.
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    Ok(Self {
      source: source.to_string(),
      segments: parse(source)?,
    })
  }

  /// The original template text.
  pub fn as_str(&self) -> &str {
    &self.source
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  /// Whether any segment is a placeholder of the `target` scope.
  pub fn uses_target(&self) -> bool {
    self
      .segments
      .iter()
      .any(|s| matches!(s, Segment::Placeholder(Placeholder::TargetAxis(_) | Placeholder::TargetAll)))
  }

  /// Check every `[target.<axis>]` against the registry.
  pub fn validate_axes(&self, axes: &AxisRegistry) -> Result<(), TemplateError> {
    for segment in &self.segments {
      if let Segment::Placeholder(Placeholder::TargetAxis(axis)) = segment
        && axes.get(axis).is_none()
      {
        return Err(TemplateError::UnknownAxis(axis.clone()));
      }
    }
    Ok(())
  }

  /// Check that renders are unique per project and target.
  ///
  /// The template must contain `[project.id]` and either `[target.all]` or
  /// one `[target.<axis>]` for every registered axis.
  pub fn validate_output_layout(&self, axes: &AxisRegistry) -> Result<(), TemplateError> {
    let has = |wanted: &Placeholder| self.segments.iter().any(|s| matches!(s, Segment::Placeholder(p) if p == wanted));

    if !has(&Placeholder::ProjectId) {
      return Err(TemplateError::MissingProjectId);
    }
    if has(&Placeholder::TargetAll) {
      return Ok(());
    }
    match axes
      .axes()
      .iter()
      .find(|axis| !has(&Placeholder::TargetAxis(axis.name.clone())))
    {
      Some(axis) => Err(TemplateError::UnpinnedAxis(axis.name.clone())),
      None => Ok(()),
    }
  }

  /// Render with values from `resolver`.
  pub fn render(&self, resolver: &impl Resolver) -> Result<String, TemplateError> {
    substitute_segments(&self.segments, resolver)
  }
}

impl std::fmt::Display for Template {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.source)
  }
}

/// Parse a template string into segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '[' {
      literal.push(ch);
      continue;
    }

    if let Some((_, '[')) = chars.peek() {
      chars.next();
      literal.push('[');
      continue;
    }

    let mut content = String::new();
    let mut found_close = false;
    for (_, c) in chars.by_ref() {
      if c == ']' {
        found_close = true;
        break;
      }
      content.push(c);
    }

    if !found_close {
      return Err(TemplateError::Unclosed(pos));
    }

    if !literal.is_empty() {
      segments.push(Segment::Literal(std::mem::take(&mut literal)));
    }
    segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

fn parse_placeholder_content(content: &str) -> Result<Placeholder, TemplateError> {
  let (scope, field) = content
    .split_once('.')
    .ok_or_else(|| TemplateError::Malformed(format!("missing '.' in '[{content}]'")))?;

  if field.is_empty() {
    return Err(TemplateError::Malformed(format!("empty field in '[{content}]'")));
  }

  let unknown_field = || TemplateError::UnknownField {
    scope: scope.to_string(),
    field: field.to_string(),
  };

  match scope {
    "solution" => match field {
      "name" => Ok(Placeholder::SolutionName),
      _ => Err(unknown_field()),
    },
    "project" => match field {
      "id" => Ok(Placeholder::ProjectId),
      "kind" => Ok(Placeholder::ProjectKind),
      _ => Err(unknown_field()),
    },
    "target" => match field {
      "all" => Ok(Placeholder::TargetAll),
      axis => Ok(Placeholder::TargetAxis(axis.to_string())),
    },
    _ => Err(TemplateError::UnknownScope(scope.to_string())),
  }
}

/// Parse and render in one step.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, TemplateError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Render pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, TemplateError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(p) => match p {
        Placeholder::SolutionName => result.push_str(resolver.resolve_solution_name()?),
        Placeholder::ProjectId => result.push_str(resolver.resolve_project_id()?),
        Placeholder::ProjectKind => result.push_str(resolver.resolve_project_kind()?.as_str()),
        Placeholder::TargetAll => result.push_str(&resolver.resolve_target()?.label_with(TARGET_PATH_SEPARATOR)),
        Placeholder::TargetAxis(axis) => {
          let value = resolver
            .resolve_target()?
            .get(axis)
            .ok_or_else(|| TemplateError::UnknownAxis(axis.clone()))?;
          result.push_str(value);
        }
      },
    }
  }

  Ok(result)
}
