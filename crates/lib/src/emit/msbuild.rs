//! MSBuild backend: `.sln` solutions and `.vcxproj` projects.
//!
//! The `platform` axis, when declared, becomes the MSBuild platform. The
//! remaining axis values joined by `_` form the configuration name.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::axis::Target;
use crate::consts::{
  MSBUILD_PLATFORM_AXIS, PROJECT_GUID_NAMESPACE, SOLUTION_GUID_NAMESPACE, TARGET_PATH_SEPARATOR, VCXPROJ_TYPE_GUID,
};
use crate::project::OutputKind;
use crate::resolve::ResolvedConfiguration;
use crate::solution::{Assembly, ProjectSummary, SolutionFile};
use crate::util::hash::stable_guid;

use super::{Backend, EmitError, RenderedFile};

const EOL: &str = "\r\n";

/// Visual Studio solution and project writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsBuildBackend;

/// `(configuration, platform)` for a target.
fn configuration_pair(target: &Target) -> (String, String) {
  let platform = target.get(MSBUILD_PLATFORM_AXIS).unwrap_or("Any").to_string();
  let rest: Vec<&str> = target
    .pairs()
    .filter(|(axis, _)| *axis != MSBUILD_PLATFORM_AXIS)
    .map(|(_, value)| value)
    .collect();
  let configuration = if rest.is_empty() {
    "Default".to_string()
  } else {
    rest.join(TARGET_PATH_SEPARATOR)
  };
  (configuration, platform)
}

/// Fail when two targets share a `configuration|platform` name.
fn check_configuration_names(assembly: &Assembly) -> Result<(), EmitError> {
  let mut seen: HashMap<String, &Target> = HashMap::with_capacity(assembly.target_count());
  for target in assembly.targets() {
    let (configuration, platform) = configuration_pair(target);
    let name = format!("{}|{}", configuration, platform);
    if let Some(first) = seen.get(&name) {
      return Err(EmitError::ConfigurationCollision {
        name,
        first: first.label(),
        second: target.label(),
      });
    }
    seen.insert(name, target);
  }
  Ok(())
}

fn project_guid(id: &str) -> String {
  stable_guid(PROJECT_GUID_NAMESPACE, id)
}

/// Escape text for XML element content and attribute values.
pub fn xml_escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      _ => out.push(ch),
    }
  }
  out
}

fn configuration_type(kind: OutputKind) -> &'static str {
  match kind {
    OutputKind::Executable => "Application",
    OutputKind::StaticLib => "StaticLibrary",
    OutputKind::DynamicLib => "DynamicLibrary",
  }
}

fn subsystem(value: &str) -> String {
  match value.to_ascii_lowercase().as_str() {
    "console" => "Console".to_string(),
    "windows" => "Windows".to_string(),
    _ => value.to_string(),
  }
}

/// Add `line` followed by the backend's line terminator.
fn line(out: &mut String, text: impl AsRef<str>) {
  out.push_str(text.as_ref());
  out.push_str(EOL);
}

fn render_solution(assembly: &Assembly, file: &SolutionFile) -> String {
  let targets: Vec<&Target> = assembly.targets().collect();
  let file_targets: Vec<usize> = file.targets.clone();

  // Projects present in at least one target of this file, declaration order.
  let projects: Vec<&ProjectSummary> = assembly
    .projects()
    .iter()
    .filter(|p| file_targets.iter().any(|&i| assembly.resolutions()[i].contains(&p.id)))
    .collect();

  let mut out = String::new();
  line(&mut out, "Microsoft Visual Studio Solution File, Format Version 12.00");
  line(&mut out, "# Visual Studio Version 16");

  for project in &projects {
    let guid = project_guid(&project.id);
    line(
      &mut out,
      format!(
        "Project(\"{{{}}}\") = \"{}\", \"{}.vcxproj\", \"{{{}}}\"",
        VCXPROJ_TYPE_GUID, project.id, project.id, guid
      ),
    );
    let deps: Vec<&String> = project
      .dependencies
      .iter()
      .filter(|d| projects.iter().any(|p| &p.id == *d))
      .collect();
    if !deps.is_empty() {
      line(&mut out, "\tProjectSection(ProjectDependencies) = postProject");
      for dep in deps {
        let dep_guid = project_guid(dep);
        line(&mut out, format!("\t\t{{{}}} = {{{}}}", dep_guid, dep_guid));
      }
      line(&mut out, "\tEndProjectSection");
    }
    line(&mut out, "EndProject");
  }

  line(&mut out, "Global");
  line(&mut out, "\tGlobalSection(SolutionConfigurationPlatforms) = preSolution");
  for &i in &file_targets {
    let (configuration, platform) = configuration_pair(targets[i]);
    line(
      &mut out,
      format!("\t\t{c}|{p} = {c}|{p}", c = configuration, p = platform),
    );
  }
  line(&mut out, "\tEndGlobalSection");

  line(&mut out, "\tGlobalSection(ProjectConfigurationPlatforms) = postSolution");
  for project in &projects {
    let guid = project_guid(&project.id);
    for &i in &file_targets {
      if !assembly.resolutions()[i].contains(&project.id) {
        continue;
      }
      let (configuration, platform) = configuration_pair(targets[i]);
      line(
        &mut out,
        format!("\t\t{{{g}}}.{c}|{p}.ActiveCfg = {c}|{p}", g = guid, c = configuration, p = platform),
      );
      line(
        &mut out,
        format!("\t\t{{{g}}}.{c}|{p}.Build.0 = {c}|{p}", g = guid, c = configuration, p = platform),
      );
    }
  }
  line(&mut out, "\tEndGlobalSection");

  line(&mut out, "\tGlobalSection(ExtensibilityGlobals) = postSolution");
  line(
    &mut out,
    format!(
      "\t\tSolutionGuid = {{{}}}",
      stable_guid(SOLUTION_GUID_NAMESPACE, &file.name)
    ),
  );
  line(&mut out, "\tEndGlobalSection");
  line(&mut out, "EndGlobal");
  out
}

/// Settings keys with a dedicated MSBuild element: `(key, group, element)`.
const MAPPED_LIST_KEYS: &[(&str, &str, &str)] = &[
  ("defines", "ClCompile", "PreprocessorDefinitions"),
  ("include_paths", "ClCompile", "AdditionalIncludeDirectories"),
  ("libraries", "Link", "AdditionalDependencies"),
  ("library_paths", "Link", "AdditionalLibraryDirectories"),
];

fn condition(configuration: &str, platform: &str) -> String {
  format!("'$(Configuration)|$(Platform)'=='{}|{}'", configuration, platform)
}

fn render_item_definitions(out: &mut String, config: &ResolvedConfiguration, cond: &str) {
  line(out, format!("  <ItemDefinitionGroup Condition=\"{}\">", xml_escape(cond)));
  for group in ["ClCompile", "Link"] {
    line(out, format!("    <{}>", group));
    for (key, _, element) in MAPPED_LIST_KEYS.iter().filter(|(_, g, _)| *g == group) {
      if let Some(values) = config.merged.get(key) {
        let joined = values.iter().map(|v| xml_escape(v)).collect::<Vec<_>>().join(";");
        line(
          out,
          format!("      <{e}>{v};%({e})</{e}>", e = element, v = joined),
        );
      }
    }
    if group == "Link"
      && let Some(value) = config.merged.get("subsystem").and_then(|v| v.first())
    {
      line(out, format!("      <SubSystem>{}</SubSystem>", xml_escape(&subsystem(value))));
    }
    line(out, format!("    </{}>", group));
  }
  line(out, "  </ItemDefinitionGroup>");
}

fn render_other_settings(out: &mut String, config: &ResolvedConfiguration, cond: &str) {
  let others: Vec<(&str, &[String])> = config
    .merged
    .iter()
    .filter(|(key, _)| {
      !MAPPED_LIST_KEYS.iter().any(|(k, _, _)| k == key) && *key != "subsystem" && *key != "output_name"
    })
    .collect();
  if others.is_empty() {
    return;
  }

  line(
    out,
    format!("  <ItemGroup Condition=\"{}\" Label=\"Settings\">", xml_escape(cond)),
  );
  for (key, values) in others {
    let joined = values.iter().map(|v| xml_escape(v)).collect::<Vec<_>>().join(";");
    line(out, format!("    <Setting Include=\"{}\">", xml_escape(key)));
    line(out, format!("      <Values>{}</Values>", joined));
    line(out, "    </Setting>");
  }
  line(out, "  </ItemGroup>");
}

fn render_project(assembly: &Assembly, project: &ProjectSummary) -> String {
  let configs: Vec<&ResolvedConfiguration> = assembly.configurations_of(&project.id).collect();
  let mut out = String::new();

  line(&mut out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>");
  line(
    &mut out,
    "<Project DefaultTargets=\"Build\" ToolsVersion=\"16.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">",
  );

  line(&mut out, "  <ItemGroup Label=\"ProjectConfigurations\">");
  for config in &configs {
    let (configuration, platform) = configuration_pair(&config.target);
    line(
      &mut out,
      format!(
        "    <ProjectConfiguration Include=\"{}|{}\">",
        xml_escape(&configuration),
        xml_escape(&platform)
      ),
    );
    line(&mut out, format!("      <Configuration>{}</Configuration>", xml_escape(&configuration)));
    line(&mut out, format!("      <Platform>{}</Platform>", xml_escape(&platform)));
    line(&mut out, "    </ProjectConfiguration>");
  }
  line(&mut out, "  </ItemGroup>");

  line(&mut out, "  <PropertyGroup Label=\"Globals\">");
  line(&mut out, format!("    <ProjectGuid>{{{}}}</ProjectGuid>", project_guid(&project.id)));
  line(&mut out, format!("    <RootNamespace>{}</RootNamespace>", xml_escape(&project.id)));
  line(&mut out, "  </PropertyGroup>");

  for config in &configs {
    let (configuration, platform) = configuration_pair(&config.target);
    let cond = condition(&configuration, &platform);
    line(
      &mut out,
      format!("  <PropertyGroup Condition=\"{}\" Label=\"Configuration\">", xml_escape(&cond)),
    );
    line(
      &mut out,
      format!("    <ConfigurationType>{}</ConfigurationType>", configuration_type(config.kind)),
    );
    line(
      &mut out,
      format!("    <OutDir>{}\\</OutDir>", xml_escape(&config.output_path.replace('/', "\\"))),
    );
    if let Some(name) = config.merged.get("output_name").and_then(|v| v.first()) {
      line(&mut out, format!("    <TargetName>{}</TargetName>", xml_escape(name)));
    }
    line(&mut out, "  </PropertyGroup>");
    render_item_definitions(&mut out, config, &cond);
    render_other_settings(&mut out, config, &cond);
  }

  // Union of dependencies over every configuration, declared order.
  let references: Vec<&String> = project
    .dependencies
    .iter()
    .filter(|dep| configs.iter().any(|c| c.dependencies.contains(dep)))
    .collect();
  if !references.is_empty() {
    line(&mut out, "  <ItemGroup>");
    for dep in references {
      line(&mut out, format!("    <ProjectReference Include=\"{}.vcxproj\">", xml_escape(dep)));
      line(&mut out, format!("      <Project>{{{}}}</Project>", project_guid(dep)));
      line(&mut out, "    </ProjectReference>");
    }
    line(&mut out, "  </ItemGroup>");
  }

  line(&mut out, "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />");
  line(&mut out, "</Project>");
  out
}

impl Backend for MsBuildBackend {
  fn name(&self) -> &'static str {
    "msbuild"
  }

  fn render(&self, assembly: &Assembly) -> Result<Vec<RenderedFile>, EmitError> {
    check_configuration_names(assembly)?;

    let mut files = Vec::new();

    for file in assembly.files() {
      files.push(RenderedFile {
        path: PathBuf::from(format!("{}.sln", file.name)),
        contents: render_solution(assembly, file).into_bytes(),
      });
    }

    for project in assembly.projects() {
      if assembly.configurations_of(&project.id).next().is_none() {
        continue;
      }
      files.push(RenderedFile {
        path: PathBuf::from(format!("{}.vcxproj", project.id)),
        contents: render_project(assembly, project).into_bytes(),
      });
    }

    Ok(files)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::demo_assembly;

  fn text(files: &[RenderedFile], name: &str) -> String {
    let file = files
      .iter()
      .find(|f| f.path.to_string_lossy() == name)
      .unwrap_or_else(|| panic!("missing {name}"));
    String::from_utf8(file.contents.clone()).unwrap()
  }

  #[test]
  fn file_set() {
    let files = MsBuildBackend.render(&demo_assembly()).unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
    assert_eq!(paths, vec!["Demo.sln", "Core.vcxproj", "App.vcxproj"]);
  }

  #[test]
  fn solution_lists_projects_and_configurations() {
    let files = MsBuildBackend.render(&demo_assembly()).unwrap();
    let sln = text(&files, "Demo.sln");

    let core_guid = project_guid("Core");
    assert!(sln.contains(&format!("\"Core\", \"Core.vcxproj\", \"{{{}}}\"", core_guid)));
    assert!(sln.contains("\t\tDebug|win = Debug|win\r\n"));
    assert!(sln.contains("\t\tRelease|linux = Release|linux\r\n"));
    assert!(sln.contains(&format!("\t\t{{{g}}} = {{{g}}}\r\n", g = core_guid)));
    assert!(sln.ends_with("EndGlobal\r\n"));
  }

  #[test]
  fn project_maps_known_settings() {
    let files = MsBuildBackend.render(&demo_assembly()).unwrap();
    let app = text(&files, "App.vcxproj");

    assert!(app.contains("<ConfigurationType>Application</ConfigurationType>"));
    assert!(app.contains("<PreprocessorDefinitions>USE_CORE=1;%(PreprocessorDefinitions)</PreprocessorDefinitions>"));
    assert!(app.contains("<AdditionalIncludeDirectories>core/include;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>"));
    assert!(app.contains("<SubSystem>Console</SubSystem>"));
    assert!(app.contains("<ProjectReference Include=\"Core.vcxproj\">"));
    assert!(app.contains("<OutDir>output\\win_Debug\\App\\</OutDir>"));
  }

  #[test]
  fn configuration_without_platform_axis() {
    let mut builder = crate::context::ContextBuilder::new();
    builder
      .register_axis(crate::axis::Axis::new("mode", ["Debug"]))
      .unwrap();
    let ctx = builder.freeze().unwrap();
    let target = ctx.axes().target(&["Debug"]).unwrap();
    assert_eq!(configuration_pair(&target), ("Debug".to_string(), "Any".to_string()));
  }

  #[test]
  fn ambiguous_configuration_names_are_rejected() {
    use crate::axis::Axis;
    use crate::context::ContextBuilder;
    use crate::project::ProjectDescriptor;
    use crate::solution::{Assembler, SolutionDecl};

    let mut builder = ContextBuilder::new();
    builder.register_axis(Axis::new("toolchain", ["vs_2019", "vs"])).unwrap();
    builder.register_axis(Axis::new("mode", ["debug", "2019_debug"])).unwrap();
    builder
      .add_project(ProjectDescriptor::new("App", OutputKind::Executable))
      .unwrap();
    let ctx = builder.freeze().unwrap();
    let assembly = Assembler::new(&ctx).assemble(&SolutionDecl::new("S").root("App")).unwrap();

    let err = MsBuildBackend.render(&assembly).unwrap_err();
    assert_eq!(
      err,
      EmitError::ConfigurationCollision {
        name: "vs_2019_debug|Any".into(),
        first: "vs_2019|debug".into(),
        second: "vs|2019_debug".into(),
      }
    );
  }

  #[test]
  fn escapes_markup() {
    assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
  }
}
