//! Test fixtures shared by unit tests.

use crate::axis::Axis;
use crate::context::{Context, ContextBuilder};
use crate::project::{OutputKind, ProjectDescriptor};
use crate::settings::SettingBlock;
use crate::solution::{Assembler, Assembly, SolutionDecl};

/// `Core` (static lib) and `App` (executable) over `win|linux` x `Debug|Release`.
///
/// `Core` exports `USE_CORE=1` and its include path; `App` depends on it.
pub fn demo_context() -> Context {
  let mut builder = ContextBuilder::new();
  builder.register_axis(Axis::new("platform", ["win", "linux"])).unwrap();
  builder.register_axis(Axis::new("mode", ["Debug", "Release"])).unwrap();
  builder
    .add_project(
      ProjectDescriptor::new("Core", OutputKind::StaticLib).with_settings(
        SettingBlock::new()
          .public("defines", "USE_CORE=1")
          .public("include_paths", "core/include")
          .private("defines", "CORE_INTERNAL"),
      ),
    )
    .unwrap();
  builder
    .add_project(
      ProjectDescriptor::new("App", OutputKind::Executable)
        .with_settings(SettingBlock::new().private("subsystem", "console"))
        .depends_on("Core"),
    )
    .unwrap();
  builder.freeze().unwrap()
}

/// The `Demo` solution rooted at `App` over [`demo_context`].
pub fn demo_assembly() -> Assembly {
  let ctx = demo_context();
  Assembler::new(&ctx)
    .assemble(&SolutionDecl::new("Demo").root("App"))
    .unwrap()
}
