//! Per-target configuration resolution.
//!
//! For one target the resolver drops excluded projects (and everything that
//! depends on them), orders the rest topologically, checks output kinds and
//! folds settings along dependency edges. Projects merge in parallel as soon
//! as their dependencies are done.

mod graph;
mod linkage;
mod scheduler;
mod types;

pub use graph::DependencyGraph;
pub use types::{LinkageConflict, ResolveError, ResolvedConfiguration, TargetResolution};

use tracing::{debug, trace};

use crate::axis::Target;
use crate::context::Context;
use crate::settings::{self, ExportedSetting};
use crate::template::Scope;

use scheduler::SlotOutput;

/// Resolves targets against one context.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
  ctx: &'a Context,
  solution: Option<&'a str>,
  members: Option<&'a [bool]>,
}

impl<'a> TargetResolver<'a> {
  pub fn new(ctx: &'a Context) -> Self {
    Self {
      ctx,
      solution: None,
      members: None,
    }
  }

  /// Only consider slots flagged in `members`. The set must be closed under
  /// dependencies.
  pub fn with_members(mut self, members: &'a [bool]) -> Self {
    self.members = Some(members);
    self
  }

  fn is_member(&self, slot: usize) -> bool {
    self.members.is_none_or(|m| m.get(slot).copied().unwrap_or(false))
  }

  /// Make `[solution.name]` available to the output layout.
  pub fn with_solution(mut self, name: &'a str) -> Self {
    self.solution = Some(name);
    self
  }

  /// Slots excluded for `target`, own rules first and then every dependent
  /// of an excluded project.
  pub fn excluded_slots(&self, target: &Target) -> Vec<bool> {
    let projects = self.ctx.projects();
    let mut excluded: Vec<bool> = projects.iter().map(|p| p.is_excluded_for(target)).collect();

    let mut changed = true;
    while changed {
      changed = false;
      for slot in 0..excluded.len() {
        if !excluded[slot] && self.ctx.dependencies_of(slot).iter().any(|&d| excluded[d]) {
          excluded[slot] = true;
          changed = true;
        }
      }
    }

    excluded
  }

  /// Resolve every non-excluded project for `target`.
  ///
  /// # Errors
  ///
  /// A cycle stops resolution immediately. Otherwise every output kind and
  /// setting conflict is collected and returned together.
  pub fn resolve(&self, target: &Target) -> Result<TargetResolution, Vec<ResolveError>> {
    let projects = self.ctx.projects();
    let excluded = self.excluded_slots(target);

    let included: Vec<usize> = (0..projects.len())
      .filter(|&s| self.is_member(s) && !excluded[s])
      .collect();
    let excluded_ids: Vec<String> = projects
      .iter()
      .enumerate()
      .filter(|(s, _)| self.is_member(*s) && excluded[*s])
      .map(|(_, p)| p.id.clone())
      .collect();

    let graph = DependencyGraph::build(self.ctx, &included);
    let order = graph.topological_order(self.ctx).map_err(|e| vec![e])?;

    let mut errors = linkage::check(self.ctx, &order);

    let work = |slot: usize, inputs: &[&SlotOutput<ResolvedConfiguration>]| self.resolve_project(target, slot, inputs);
    let (outputs, merge_errors) = scheduler::run(&graph, &order, |slot| self.ctx.dependencies_of(slot).to_vec(), &work);
    errors.extend(merge_errors);

    if !errors.is_empty() {
      debug!(target = %target, errors = errors.len(), "target failed to resolve");
      return Err(errors);
    }

    let configurations: Vec<ResolvedConfiguration> = outputs.into_iter().flatten().map(|o| o.value).collect();
    debug!(
      target = %target,
      projects = configurations.len(),
      excluded = excluded_ids.len(),
      "target resolved"
    );

    Ok(TargetResolution::new(target.clone(), configurations, excluded_ids))
  }

  fn resolve_project(
    &self,
    target: &Target,
    slot: usize,
    inputs: &[&SlotOutput<ResolvedConfiguration>],
  ) -> Result<SlotOutput<ResolvedConfiguration>, Vec<ResolveError>> {
    let Some(project) = self.ctx.projects().get(slot) else {
      return Err(Vec::new());
    };

    let own = project.effective_settings(target);
    let dependency_exports = || inputs.iter().map(|input| input.exports.as_slice());

    let merged = settings::merge(self.ctx.schema(), &own, dependency_exports()).map_err(|conflicts| {
      conflicts
        .into_iter()
        .map(|c| ResolveError::ConflictingSetting {
          project: project.id.clone(),
          key: c.key,
          candidates: c.candidates,
        })
        .collect::<Vec<_>>()
    })?;

    let exports: Vec<ExportedSetting> = settings::exports(slot, &project.id, &own, dependency_exports());

    let mut scope = Scope::new().project(&project.id, project.kind).target(target);
    if let Some(solution) = self.solution {
      scope = scope.solution(solution);
    }
    let output_path = self.ctx.layout().render(&scope).map_err(|source| {
      vec![ResolveError::OutputPath {
        project: project.id.clone(),
        source,
      }]
    })?;

    trace!(project = %project.id, target = %target, keys = merged.len(), "merged project");

    Ok(SlotOutput {
      value: ResolvedConfiguration {
        project_id: project.id.clone(),
        kind: project.kind,
        target: target.clone(),
        merged,
        output_path,
        dependencies: inputs.iter().map(|i| i.value.project_id.clone()).collect(),
      },
      exports,
    })
  }
}

/// Resolve `target` against `ctx` with no solution in scope.
pub fn resolve_target(ctx: &Context, target: &Target) -> Result<TargetResolution, Vec<ResolveError>> {
  TargetResolver::new(ctx).resolve(target)
}
