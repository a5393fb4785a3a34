//! Target axis registry and target-space enumeration.

use tracing::{debug, warn};

use super::types::{Axis, AxisError, RuleAction, Target, TargetPattern, TargetRule, TargetSelector};

/// Ordered collection of build axes.
///
/// Axes keep their registration order and values keep their declaration
/// order; enumeration, labels and emitted files all follow that order.
#[derive(Debug, Clone, Default)]
pub struct AxisRegistry {
  axes: Vec<Axis>,
}

impl AxisRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an axis.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateAxis` if the name is taken and `DuplicateValue` if the
  /// axis repeats a value. An axis with no values is accepted; it makes the
  /// target space empty, which the assembler reports as `EmptyTargetSet`.
  pub fn register(&mut self, axis: Axis) -> Result<(), AxisError> {
    if self.get(&axis.name).is_some() {
      return Err(AxisError::DuplicateAxis { name: axis.name });
    }

    for (i, value) in axis.values.iter().enumerate() {
      if axis.values[..i].contains(value) {
        return Err(AxisError::DuplicateValue {
          axis: axis.name.clone(),
          value: value.clone(),
        });
      }
    }

    if axis.values.is_empty() {
      warn!(axis = %axis.name, "axis declares no values; target space is empty");
    }

    debug!(axis = %axis.name, values = axis.values.len(), "registered axis");
    self.axes.push(axis);
    Ok(())
  }

  /// Registered axes in order.
  pub fn axes(&self) -> &[Axis] {
    &self.axes
  }

  pub fn get(&self, name: &str) -> Option<&Axis> {
    self.axes.iter().find(|a| a.name == name)
  }

  pub fn len(&self) -> usize {
    self.axes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.axes.is_empty()
  }

  /// Size of the full cross product. Zero when there are no axes; saturates
  /// at `usize::MAX`.
  pub fn target_count(&self) -> usize {
    space_size(&self.axes)
  }

  /// Lazily enumerate every target.
  ///
  /// The first axis varies slowest and the last fastest. Each call returns a
  /// fresh iterator, so enumeration is restartable.
  pub fn enumerate_targets(&self) -> TargetIter<'_> {
    TargetIter::new(&self.axes)
  }

  /// Build a target from one value per axis, in registration order.
  pub fn target(&self, values: &[&str]) -> Result<Target, AxisError> {
    if values.len() != self.axes.len() {
      return Err(AxisError::IncompleteTarget {
        expected: self.axes.len(),
        actual: values.len(),
      });
    }

    let pairs = self
      .axes
      .iter()
      .zip(values)
      .map(|(axis, value)| {
        axis
          .position(value)
          .map(|_| (axis.name.clone(), value.to_string()))
          .ok_or_else(|| AxisError::UnknownValue {
            axis: axis.name.clone(),
            value: value.to_string(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Target::from_pairs(pairs))
  }

  /// Check that every pin names a registered axis and one of its values.
  pub fn validate_pattern(&self, pattern: &TargetPattern) -> Result<(), AxisError> {
    for (axis, value) in pattern.pins() {
      self.check_value(axis, value)?;
    }
    Ok(())
  }

  /// Check that every restricted axis and value exists.
  pub fn validate_selector(&self, selector: &TargetSelector) -> Result<(), AxisError> {
    for (axis, values) in selector.choices() {
      for value in values {
        self.check_value(axis, value)?;
      }
      if values.is_empty() {
        self.get(axis).ok_or_else(|| AxisError::UnknownAxis { axis: axis.to_string() })?;
      }
    }
    Ok(())
  }

  /// Targets matching any selector, in enumeration order.
  ///
  /// An empty selector list selects the whole target space.
  pub fn select(&self, selectors: &[TargetSelector]) -> Vec<Target> {
    self
      .enumerate_targets()
      .filter(|t| selectors.is_empty() || selectors.iter().any(|s| s.matches(t)))
      .collect()
  }

  fn check_value(&self, axis: &str, value: &str) -> Result<(), AxisError> {
    let found = self.get(axis).ok_or_else(|| AxisError::UnknownAxis { axis: axis.to_string() })?;
    found.position(value).map(|_| ()).ok_or_else(|| AxisError::UnknownValue {
      axis: axis.to_string(),
      value: value.to_string(),
    })
  }
}

/// Whether `rules` exclude `target`.
///
/// Among matching rules the most specific one wins. When an `Exclude` and an
/// `Include` rule match with equal specificity, the target is excluded. With
/// no matching rule the target is kept.
pub fn is_excluded(target: &Target, rules: &[TargetRule]) -> bool {
  let mut best: Option<(usize, RuleAction)> = None;

  for rule in rules.iter().filter(|r| r.pattern.matches(target)) {
    let specificity = rule.pattern.specificity();
    best = match best {
      None => Some((specificity, rule.action)),
      Some((s, _)) if specificity > s => Some((specificity, rule.action)),
      Some((s, _)) if specificity == s && rule.action == RuleAction::Exclude => Some((s, RuleAction::Exclude)),
      keep => keep,
    };
  }

  matches!(best, Some((_, RuleAction::Exclude)))
}

fn space_size(axes: &[Axis]) -> usize {
  if axes.is_empty() || axes.iter().any(|a| a.values.is_empty()) {
    return 0;
  }
  axes
    .iter()
    .try_fold(1usize, |acc, a| acc.checked_mul(a.values.len()))
    .unwrap_or(usize::MAX)
}

/// Lazy cross-product iterator over an axis list.
///
/// Holds one index per axis and advances them like an odometer.
#[derive(Debug, Clone)]
pub struct TargetIter<'a> {
  axes: &'a [Axis],
  indices: Vec<usize>,
  remaining: usize,
}

impl<'a> TargetIter<'a> {
  fn new(axes: &'a [Axis]) -> Self {
    Self {
      axes,
      indices: vec![0; axes.len()],
      remaining: space_size(axes),
    }
  }

  fn advance(&mut self) {
    for pos in (0..self.indices.len()).rev() {
      self.indices[pos] += 1;
      if self.indices[pos] < self.axes[pos].values.len() {
        return;
      }
      self.indices[pos] = 0;
    }
  }
}

impl Iterator for TargetIter<'_> {
  type Item = Target;

  fn next(&mut self) -> Option<Target> {
    if self.remaining == 0 {
      return None;
    }

    let pairs = self
      .axes
      .iter()
      .zip(&self.indices)
      .map(|(axis, &i)| (axis.name.clone(), axis.values[i].clone()))
      .collect();

    self.remaining -= 1;
    self.advance();
    Some(Target::from_pairs(pairs))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl ExactSizeIterator for TargetIter<'_> {}
