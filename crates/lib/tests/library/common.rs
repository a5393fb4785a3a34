//! Shared builders for library integration tests.

use slngen_lib::axis::{Axis, Target};
use slngen_lib::context::{Context, ContextBuilder};
use slngen_lib::project::ProjectDescriptor;
use slngen_lib::resolve::{ResolvedConfiguration, TargetResolution, resolve_target};

/// Freeze a context with a single `mode` axis over `projects`.
pub fn context(projects: Vec<ProjectDescriptor>) -> Context {
  let mut builder = ContextBuilder::new();
  builder.register_axis(Axis::new("mode", ["debug", "release"])).unwrap();
  for project in projects {
    builder.add_project(project).unwrap();
  }
  builder.freeze().unwrap()
}

pub fn debug(ctx: &Context) -> Target {
  ctx.axes().target(&["debug"]).unwrap()
}

pub fn resolve_debug(ctx: &Context) -> TargetResolution {
  resolve_target(ctx, &debug(ctx)).unwrap()
}

/// Values of `key` for `project`, empty when unset.
pub fn values(resolution: &TargetResolution, project: &str, key: &str) -> Vec<String> {
  let config: &ResolvedConfiguration = resolution
    .get(project)
    .unwrap_or_else(|| panic!("{project} not resolved"));
  config.merged.get(key).map(<[String]>::to_vec).unwrap_or_default()
}
