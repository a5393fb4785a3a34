//! Fan-in scheduling of per-project merges on the rayon pool.
//!
//! Each project owns a counter of unresolved dependencies. A project is
//! spawned when its counter reaches zero, so independent subtrees merge in
//! parallel while every project still sees finished dependency results.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use tracing::trace;

use crate::settings::ExportedSetting;

use super::graph::DependencyGraph;
use super::types::ResolveError;

/// What one project hands to its dependents.
pub struct SlotOutput<T> {
  pub value: T,
  pub exports: Vec<ExportedSetting>,
}

/// Result cells shared by every task of one run.
struct Shared<'a, T, F> {
  order: &'a [usize],
  position: Vec<Option<usize>>,
  dependents: Vec<Vec<usize>>,
  pending: Vec<AtomicUsize>,
  cells: Vec<OnceLock<Option<SlotOutput<T>>>>,
  errors: Mutex<Vec<(usize, ResolveError)>>,
  work: &'a F,
}

/// Run `work` once per slot in `order`, dependencies first.
///
/// `work` receives the slot and the outputs of its direct dependencies in the
/// order `deps_of` lists them. A project whose dependency failed is skipped
/// and produces no output and no error of its own.
///
/// Returns outputs in `order` plus every error sorted by slot.
pub fn run<T, F>(
  graph: &DependencyGraph,
  order: &[usize],
  deps_of: impl Fn(usize) -> Vec<usize>,
  work: &F,
) -> (Vec<Option<SlotOutput<T>>>, Vec<ResolveError>)
where
  T: Send + Sync,
  F: Fn(usize, &[&SlotOutput<T>]) -> Result<SlotOutput<T>, Vec<ResolveError>> + Sync,
{
  let max_slot = order.iter().copied().max().map_or(0, |m| m + 1);
  let mut position = vec![None; max_slot];
  for (i, &slot) in order.iter().enumerate() {
    position[slot] = Some(i);
  }

  let deps: Vec<Vec<usize>> = order.iter().map(|&slot| deps_of(slot)).collect();
  let shared = Shared {
    order,
    position,
    dependents: order.iter().map(|&slot| graph.dependents(slot)).collect(),
    pending: order
      .iter()
      .map(|&slot| AtomicUsize::new(graph.dependencies(slot).len()))
      .collect(),
    cells: order.iter().map(|_| OnceLock::new()).collect(),
    errors: Mutex::new(Vec::new()),
    work,
  };

  let roots: Vec<usize> = (0..order.len())
    .filter(|&i| shared.pending[i].load(Ordering::Acquire) == 0)
    .collect();

  rayon::scope(|scope| {
    for i in roots {
      let shared = &shared;
      let deps = &deps;
      scope.spawn(move |scope| execute(scope, shared, deps, i));
    }
  });

  let mut errors = shared.errors.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
  errors.sort_by_key(|(slot, _)| *slot);

  let outputs = shared
    .cells
    .into_iter()
    .map(|cell| cell.into_inner().flatten())
    .collect();

  (outputs, errors.into_iter().map(|(_, e)| e).collect())
}

fn execute<'s, T, F>(scope: &rayon::Scope<'s>, shared: &'s Shared<'s, T, F>, deps: &'s [Vec<usize>], i: usize)
where
  T: Send + Sync,
  F: Fn(usize, &[&SlotOutput<T>]) -> Result<SlotOutput<T>, Vec<ResolveError>> + Sync,
{
  let slot = shared.order[i];

  let inputs: Option<Vec<&SlotOutput<T>>> = deps[i]
    .iter()
    .map(|dep| {
      shared
        .position
        .get(*dep)
        .copied()
        .flatten()
        .and_then(|p| shared.cells[p].get())
        .and_then(Option::as_ref)
    })
    .collect();

  let output = match inputs {
    Some(inputs) => match (shared.work)(slot, &inputs) {
      Ok(output) => Some(output),
      Err(errs) => {
        let mut errors = shared.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        errors.extend(errs.into_iter().map(|e| (slot, e)));
        None
      }
    },
    None => {
      trace!(slot, "skipped: dependency failed");
      None
    }
  };

  // Only this task writes this cell.
  let _ = shared.cells[i].set(output);

  for &dependent in &shared.dependents[i] {
    let Some(j) = shared.position.get(dependent).copied().flatten() else {
      continue;
    };
    if shared.pending[j].fetch_sub(1, Ordering::AcqRel) == 1 {
      scope.spawn(move |scope| execute(scope, shared, deps, j));
    }
  }
}
