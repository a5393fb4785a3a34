//! Solution assembly: closure, target selection and parallel resolution.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::axis::Target;
use crate::context::Context;
use crate::resolve::{ResolveError, TargetResolution, TargetResolver};
use crate::template::{Scope, Template};

use super::types::{AssembleError, Assembly, ProjectSummary, SolutionDecl, SolutionFile};

/// Assembles solutions against one context.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
  ctx: &'a Context,
  jobs: Option<usize>,
}

impl<'a> Assembler<'a> {
  pub fn new(ctx: &'a Context) -> Self {
    Self { ctx, jobs: None }
  }

  /// Bound the worker pool. `None` uses rayon's global pool.
  pub fn jobs(mut self, jobs: Option<usize>) -> Self {
    self.jobs = jobs;
    self
  }

  /// Assemble `decl`.
  ///
  /// # Errors
  ///
  /// Declaration problems (unknown roots, invalid selectors, a bad file name
  /// template) are reported before anything is resolved. After that, every
  /// target is resolved and every failure is returned, each distinct failure
  /// once with the targets it occurred on.
  pub fn assemble(&self, decl: &SolutionDecl) -> Result<Assembly, Vec<AssembleError>> {
    let mut errors = Vec::new();

    let mut roots = Vec::with_capacity(decl.roots.len());
    for root in &decl.roots {
      match self.ctx.projects().resolve_reference(root, None) {
        Ok(slot) => roots.push(slot),
        Err(err) => errors.push(AssembleError::Root(err)),
      }
    }

    for selector in &decl.selectors {
      if let Err(err) = self.ctx.axes().validate_selector(selector) {
        errors.push(AssembleError::Selector(err));
      }
    }

    let file_name = match Template::parse(&decl.file_name) {
      Ok(template) => Some(template),
      Err(source) => {
        errors.push(AssembleError::FileName {
          template: decl.file_name.clone(),
          source,
        });
        None
      }
    };

    let (Some(file_name), true) = (file_name, errors.is_empty()) else {
      return Err(errors);
    };

    let targets = self.ctx.axes().select(&decl.selectors);
    if targets.is_empty() {
      return Err(vec![AssembleError::EmptyTargetSet {
        solution: decl.name.clone(),
      }]);
    }

    let files = group_files(&decl.name, &file_name, &targets).map_err(|source| {
      vec![AssembleError::FileName {
        template: decl.file_name.clone(),
        source,
      }]
    })?;

    let members = self.closure(&roots);
    info!(
      solution = %decl.name,
      projects = members.iter().filter(|m| **m).count(),
      targets = targets.len(),
      "assembling solution"
    );

    let resolver = TargetResolver::new(self.ctx)
      .with_solution(&decl.name)
      .with_members(&members);
    let results = self.resolve_all(&resolver, &targets)?;

    let mut failures: Vec<AssembleError> = Vec::new();
    let mut resolutions = Vec::with_capacity(results.len());
    for (target, result) in targets.iter().zip(results) {
      match result {
        Ok(resolution) => resolutions.push(resolution),
        Err(errs) => {
          for error in errs {
            record_failure(&mut failures, error, target);
          }
        }
      }
    }

    if !failures.is_empty() {
      debug!(solution = %decl.name, failures = failures.len(), "assembly failed");
      return Err(failures);
    }

    let projects = self
      .ctx
      .projects()
      .iter()
      .enumerate()
      .filter(|(slot, _)| members[*slot])
      .map(|(_, p)| ProjectSummary {
        id: p.id.clone(),
        kind: p.kind,
        dependencies: p.dependencies.iter().map(|d| d.id().to_string()).collect(),
      })
      .collect();

    Ok(Assembly {
      name: decl.name.clone(),
      projects,
      resolutions,
      files,
    })
  }

  /// Membership flags for `roots` and everything they depend on.
  fn closure(&self, roots: &[usize]) -> Vec<bool> {
    let mut members = vec![false; self.ctx.projects().len()];
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(slot) = stack.pop() {
      if members[slot] {
        continue;
      }
      members[slot] = true;
      stack.extend(self.ctx.dependencies_of(slot));
    }
    members
  }

  fn resolve_all(
    &self,
    resolver: &TargetResolver<'_>,
    targets: &[Target],
  ) -> Result<Vec<Result<TargetResolution, Vec<ResolveError>>>, Vec<AssembleError>> {
    let run = || targets.par_iter().map(|t| resolver.resolve(t)).collect::<Vec<_>>();

    match self.jobs {
      None => Ok(run()),
      Some(jobs) => {
        let pool = rayon::ThreadPoolBuilder::new()
          .num_threads(jobs.max(1))
          .build()
          .map_err(|e| vec![AssembleError::Pool(e.to_string())])?;
        Ok(pool.install(run))
      }
    }
  }
}

fn record_failure(failures: &mut Vec<AssembleError>, error: ResolveError, target: &Target) {
  let label = target.label();
  for failure in failures.iter_mut() {
    if let AssembleError::Resolve { error: seen, targets } = failure
      && *seen == error
    {
      targets.push(label);
      return;
    }
  }
  failures.push(AssembleError::Resolve {
    error,
    targets: vec![label],
  });
}

fn group_files(
  solution: &str,
  template: &Template,
  targets: &[Target],
) -> Result<Vec<SolutionFile>, crate::template::TemplateError> {
  let mut files: Vec<SolutionFile> = Vec::new();
  for (i, target) in targets.iter().enumerate() {
    let name = template.render(&Scope::new().solution(solution).target(target))?;
    match files.iter_mut().find(|f| f.name == name) {
      Some(file) => file.targets.push(i),
      None => files.push(SolutionFile { name, targets: vec![i] }),
    }
  }
  Ok(files)
}
