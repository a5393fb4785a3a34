//! Implementation of the `slngen targets` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use slngen_lib::generate::GenerateError;
use slngen_lib::loader;
use slngen_lib::solution::AssembleError;

use super::report;
use crate::output::{OutputFormat, print_json, print_stat, symbols};

pub fn cmd_targets(input: &Path, format: OutputFormat) -> Result<()> {
  let loaded = loader::load(input).map_err(|e| report(format, &GenerateError::Load(e)))?;
  let axes = loaded.context.axes();

  let invalid: Vec<AssembleError> = loaded
    .solution
    .selectors
    .iter()
    .filter_map(|s| axes.validate_selector(s).err())
    .map(AssembleError::Selector)
    .collect();
  if !invalid.is_empty() {
    return Err(report(format, &GenerateError::Assemble(invalid)));
  }

  let selected = axes.select(&loaded.solution.selectors);
  let targets: Vec<_> = axes
    .enumerate_targets()
    .map(|t| {
      let is_selected = selected.contains(&t);
      (t, is_selected)
    })
    .collect();

  if format.is_json() {
    return print_json(&json!({
      "axes": axes.axes(),
      "targets": targets
        .iter()
        .map(|(t, s)| json!({ "label": t.label(), "target": t, "selected": s }))
        .collect::<Vec<_>>(),
    }));
  }

  for axis in axes.axes() {
    print_stat(&axis.name, &axis.values.join(", "));
  }
  println!();
  for (target, is_selected) in &targets {
    if *is_selected {
      println!(
        "  {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        target.label()
      );
    } else {
      println!(
        "  {} {}",
        symbols::EXCLUDED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        target.label().if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }
  println!();
  print_stat("Selected", &format!("{} of {}", selected.len(), targets.len()));
  Ok(())
}
