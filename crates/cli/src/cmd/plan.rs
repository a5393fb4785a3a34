//! Implementation of the `slngen plan` command.
//!
//! Resolves the declaration exactly as `generate` would and prints every
//! configuration instead of writing files.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use slngen_lib::generate::plan;

use super::report;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_plan(input: &Path, jobs: Option<usize>, format: OutputFormat) -> Result<()> {
  let (_, assembly) = plan(input, jobs).map_err(|e| report(format, &e))?;

  if format.is_json() {
    let targets: Vec<_> = assembly
      .resolutions()
      .iter()
      .map(|r| {
        json!({
          "target": r.target(),
          "label": r.target().label(),
          "excluded": r.excluded(),
          "configurations": r.iter().collect::<Vec<_>>(),
        })
      })
      .collect();
    return print_json(&json!({
      "solution": assembly.name(),
      "projects": assembly.projects(),
      "files": assembly.files().iter().map(|f| &f.name).collect::<Vec<_>>(),
      "targets": targets,
    }));
  }

  print_info(&format!(
    "Solution {}: {} target(s), {} configuration(s)",
    assembly.name(),
    assembly.target_count(),
    assembly.configuration_count()
  ));

  for resolution in assembly.resolutions() {
    println!();
    println!(
      "{}",
      resolution
        .target()
        .label()
        .if_supports_color(Stream::Stdout, |s| s.bold())
    );
    for config in resolution.iter() {
      println!(
        "  {} {} ({}) {} {}",
        symbols::INFO,
        config.project_id,
        config.kind,
        symbols::ARROW,
        config.output_path
      );
      for (key, values) in config.merged.iter() {
        println!(
          "      {} = {}",
          key.if_supports_color(Stream::Stdout, |s| s.dimmed()),
          values.join(";")
        );
      }
    }
    for id in resolution.excluded() {
      println!(
        "  {} {} {}",
        symbols::EXCLUDED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        id,
        "(excluded)".if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }

  Ok(())
}
