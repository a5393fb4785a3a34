//! Setting propagation across dependency graphs.

use slngen_lib::project::{OutputKind, ProjectDescriptor};
use slngen_lib::resolve::{LinkageConflict, ResolveError, resolve_target};
use slngen_lib::settings::SettingBlock;

use super::common::{context, debug, resolve_debug, values};

fn lib(id: &str) -> ProjectDescriptor {
  ProjectDescriptor::new(id, OutputKind::StaticLib)
}

#[test]
fn public_settings_reach_every_transitive_dependent() {
  let ctx = context(vec![
    lib("base").with_settings(SettingBlock::new().public("include_paths", "base/include")),
    lib("mid").depends_on("base"),
    ProjectDescriptor::new("app", OutputKind::Executable).depends_on("mid"),
  ]);
  let r = resolve_debug(&ctx);

  assert_eq!(values(&r, "base", "include_paths"), ["base/include"]);
  assert_eq!(values(&r, "mid", "include_paths"), ["base/include"]);
  assert_eq!(values(&r, "app", "include_paths"), ["base/include"]);
}

#[test]
fn private_settings_stay_local() {
  let ctx = context(vec![
    lib("base").with_settings(SettingBlock::new().private("defines", "BASE_BUILD")),
    lib("mid").depends_on("base"),
  ]);
  let r = resolve_debug(&ctx);

  assert_eq!(values(&r, "base", "defines"), ["BASE_BUILD"]);
  assert!(values(&r, "mid", "defines").is_empty());
}

#[test]
fn interface_settings_travel_one_hop() {
  let ctx = context(vec![
    lib("headers").with_settings(SettingBlock::new().interface("include_paths", "headers/include")),
    lib("mid").depends_on("headers"),
    lib("top").depends_on("mid"),
  ]);
  let r = resolve_debug(&ctx);

  assert!(values(&r, "headers", "include_paths").is_empty());
  assert_eq!(values(&r, "mid", "include_paths"), ["headers/include"]);
  assert!(values(&r, "top", "include_paths").is_empty());
}

#[test]
fn diamond_contributions_are_folded_once() {
  let ctx = context(vec![
    lib("base").with_settings(SettingBlock::new().public("libraries", "base.lib")),
    lib("left").depends_on("base"),
    lib("right").depends_on("base"),
    ProjectDescriptor::new("app", OutputKind::Executable)
      .depends_on("left")
      .depends_on("right"),
  ]);
  let r = resolve_debug(&ctx);

  assert_eq!(values(&r, "app", "libraries"), ["base.lib"]);
}

#[test]
fn local_singular_overrides_inherited() {
  let ctx = context(vec![
    lib("base").with_settings(SettingBlock::new().public("subsystem", "console")),
    ProjectDescriptor::new("app", OutputKind::Executable)
      .with_settings(SettingBlock::new().private("subsystem", "windows"))
      .depends_on("base"),
  ]);
  let r = resolve_debug(&ctx);

  assert_eq!(values(&r, "app", "subsystem"), ["windows"]);
}

#[test]
fn sibling_singular_conflict_is_fatal() {
  let ctx = context(vec![
    lib("console").with_settings(SettingBlock::new().public("subsystem", "console")),
    lib("gui").with_settings(SettingBlock::new().public("subsystem", "windows")),
    ProjectDescriptor::new("app", OutputKind::Executable)
      .depends_on("console")
      .depends_on("gui"),
  ]);

  let errors = resolve_target(&ctx, &debug(&ctx)).unwrap_err();
  assert_eq!(errors.len(), 1);
  match &errors[0] {
    ResolveError::ConflictingSetting { project, key, .. } => {
      assert_eq!(project, "app");
      assert_eq!(key, "subsystem");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn two_project_cycle_names_both() {
  let ctx = context(vec![lib("A").depends_on("B"), lib("B").depends_on("A")]);

  let errors = resolve_target(&ctx, &debug(&ctx)).unwrap_err();
  assert_eq!(
    errors,
    vec![ResolveError::CyclicDependency {
      cycle: vec!["A".to_string(), "B".to_string()]
    }]
  );
}

#[test]
fn depending_on_an_executable_is_rejected() {
  let ctx = context(vec![
    ProjectDescriptor::new("tool", OutputKind::Executable),
    lib("gen").depends_on("tool"),
  ]);

  let errors = resolve_target(&ctx, &debug(&ctx)).unwrap_err();
  assert!(matches!(
    &errors[0],
    ResolveError::ConflictingOutputKind(LinkageConflict::DependsOnExecutable { .. })
  ));
}

#[test]
fn one_configuration_per_project_and_target() {
  let ctx = context(vec![
    lib("a"),
    lib("b").depends_on("a"),
    ProjectDescriptor::new("c", OutputKind::DynamicLib).depends_on("b"),
  ]);

  for target in ctx.axes().enumerate_targets() {
    let r = resolve_target(&ctx, &target).unwrap();
    assert_eq!(r.len(), 3);
    assert!(r.iter().all(|c| c.target == target));
  }
}
