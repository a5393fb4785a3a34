//! Implementation of the `slngen generate` command.
//!
//! Loads a declaration, resolves every selected target and writes the
//! backend's files. Nothing is written unless resolution succeeds; files
//! whose contents did not change are left untouched.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use tracing::debug;

use slngen_lib::emit::BackendKind;
use slngen_lib::generate::{GenerateError, GenerateOptions, generate};
use slngen_lib::util::hash::hash_file;

use super::report;
use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, symbols};

pub fn cmd_generate(
  input: &Path,
  out: &Path,
  backend: BackendKind,
  jobs: Option<usize>,
  format: OutputFormat,
  verbose: bool,
) -> Result<()> {
  let start = Instant::now();
  let options = GenerateOptions {
    out_dir: out.to_path_buf(),
    backend,
    jobs,
  };

  let summary = match generate(input, &options) {
    Ok(r) => r,
    Err(GenerateError::Write(partial)) if !format.is_json() => {
      for path in &partial.written {
        println!("  {} {}", symbols::SUCCESS, path.display());
      }
      return Err(report(format, &GenerateError::Write(partial)));
    }
    Err(e) => return Err(report(format, &e)),
  };

  debug!(elapsed_ms = start.elapsed().as_millis() as u64, "generate finished");

  if format.is_json() {
    return print_json(&summary);
  }

  print_success(&format!(
    "Generated {} ({}) in {}",
    summary.solution,
    summary.backend,
    format_duration(start.elapsed())
  ));
  print_stat("Targets", &summary.targets.to_string());
  print_stat("Configurations", &summary.configurations.to_string());
  print_stat("Written", &summary.emit.written.len().to_string());
  print_stat("Unchanged", &summary.emit.unchanged.len().to_string());

  if verbose {
    println!();
    for path in &summary.emit.written {
      let hash = hash_file(path).map(|h| h.short().to_string()).unwrap_or_default();
      println!(
        "  {} {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        path.display(),
        hash.if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
    for path in &summary.emit.unchanged {
      println!(
        "  {} {}",
        symbols::UNCHANGED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        path.display()
      );
    }
  }

  Ok(())
}
