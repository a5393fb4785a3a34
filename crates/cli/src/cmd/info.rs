use anyhow::Result;

use slngen_lib::consts::DECLARATION_VERSION;
use slngen_lib::emit::BackendKind;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let backends: Vec<&str> = BackendKind::ALL.iter().map(BackendKind::as_str).collect();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "declaration_version": DECLARATION_VERSION,
      "backends": backends,
    }));
  }

  println!("slngen {}", env!("CARGO_PKG_VERSION"));
  print_stat("Declaration format", &DECLARATION_VERSION.to_string());
  print_stat("Backends", &backends.join(", "));
  Ok(())
}
