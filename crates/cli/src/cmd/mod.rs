mod generate;
mod info;
mod plan;
mod targets;

pub use generate::cmd_generate;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use targets::cmd_targets;

use slngen_lib::generate::GenerateError;

use crate::output::{OutputFormat, print_diagnostics};

/// A failure whose diagnostics were already printed.
#[derive(Debug)]
pub struct Reported;

impl std::fmt::Display for Reported {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("errors reported")
  }
}

impl std::error::Error for Reported {}

/// Print every diagnostic in `err` and turn it into [`Reported`].
pub(crate) fn report(format: OutputFormat, err: &GenerateError) -> anyhow::Error {
  match print_diagnostics(format, &err.diagnostics()) {
    Ok(()) => Reported.into(),
    Err(e) => e,
  }
}
