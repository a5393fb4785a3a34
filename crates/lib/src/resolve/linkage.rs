//! Output kind compatibility along dependency edges.

use std::collections::{BTreeMap, HashSet};

use crate::context::Context;
use crate::project::OutputKind;

use super::types::{LinkageConflict, ResolveError};

/// Check that the included projects can be linked as declared.
///
/// Nothing may depend on an executable. For every executable, each static
/// library must be absorbed by exactly one link unit: the executable itself
/// or one of the dynamic libraries it loads.
pub fn check(ctx: &Context, order: &[usize]) -> Vec<ResolveError> {
  let included: HashSet<usize> = order.iter().copied().collect();
  let mut errors = Vec::new();

  for &slot in order {
    let Some(project) = ctx.projects().get(slot) else {
      continue;
    };
    for &dep in ctx.dependencies_of(slot) {
      if let Some(dependency) = ctx.projects().get(dep)
        && dependency.kind == OutputKind::Executable
      {
        errors.push(ResolveError::ConflictingOutputKind(LinkageConflict::DependsOnExecutable {
          dependent: project.id.clone(),
          executable: dependency.id.clone(),
        }));
      }
    }
  }

  for &slot in order {
    let Some(project) = ctx.projects().get(slot) else {
      continue;
    };
    if project.kind != OutputKind::Executable {
      continue;
    }

    let mut owners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut units = vec![slot];
    let mut seen_units = HashSet::from([slot]);

    while let Some(unit) = units.pop() {
      let (libraries, dylibs) = link_unit(ctx, unit, &included);
      for library in libraries {
        owners.entry(library).or_default().push(unit);
      }
      units.extend(dylibs.into_iter().filter(|d| seen_units.insert(*d)));
    }

    for (library, mut unit_slots) in owners {
      if unit_slots.len() < 2 {
        continue;
      }
      unit_slots.sort_unstable();
      let ids = |s: usize| ctx.projects().get(s).map(|p| p.id.clone()).unwrap_or_default();
      errors.push(ResolveError::ConflictingOutputKind(LinkageConflict::LinkedTwice {
        executable: project.id.clone(),
        library: ids(library),
        units: unit_slots.into_iter().map(ids).collect(),
      }));
    }
  }

  errors
}

/// Static libraries linked into `unit`, following static libraries
/// transitively, plus the dynamic libraries reached along the way. Dynamic
/// libraries are separate units and are not descended into.
fn link_unit(ctx: &Context, unit: usize, included: &HashSet<usize>) -> (Vec<usize>, Vec<usize>) {
  let mut absorbed = Vec::new();
  let mut dylibs = Vec::new();
  let mut visited = HashSet::new();
  let mut stack: Vec<usize> = ctx.dependencies_of(unit).iter().rev().copied().collect();

  while let Some(slot) = stack.pop() {
    if !included.contains(&slot) || !visited.insert(slot) {
      continue;
    }
    let Some(project) = ctx.projects().get(slot) else {
      continue;
    };
    match project.kind {
      OutputKind::StaticLib => {
        absorbed.push(slot);
        stack.extend(ctx.dependencies_of(slot).iter().rev().copied());
      }
      OutputKind::DynamicLib => dylibs.push(slot),
      OutputKind::Executable => {}
    }
  }

  (absorbed, dylibs)
}
