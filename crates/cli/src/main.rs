mod cmd;
mod output;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use slngen_lib::emit::BackendKind;

use crate::cmd::Reported;
use crate::output::{OutputFormat, print_error, print_json};

/// slngen - resolve multi-target build configurations into solution files
#[derive(Parser)]
#[command(name = "slngen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a declaration and write solution and project files
  Generate {
    /// Path to the declaration file
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Backend: json or msbuild
    #[arg(short, long, default_value = "json")]
    backend: BackendKind,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    jobs: Option<NonZeroUsize>,
  },

  /// Show every resolved configuration without writing anything
  Plan {
    /// Path to the declaration file
    input: PathBuf,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    jobs: Option<NonZeroUsize>,
  },

  /// List the enumerated target space and the solution's selection
  Targets {
    /// Path to the declaration file
    input: PathBuf,
  },

  /// Show version and supported backends
  Info,
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let verbose = cli.verbose > 0;
  let result = match cli.command {
    Commands::Generate {
      input,
      out,
      backend,
      jobs,
    } => cmd::cmd_generate(&input, &out, backend, jobs.map(NonZeroUsize::get), cli.format, verbose),
    Commands::Plan { input, jobs } => cmd::cmd_plan(&input, jobs.map(NonZeroUsize::get), cli.format),
    Commands::Targets { input } => cmd::cmd_targets(&input, cli.format),
    Commands::Info => cmd::cmd_info(cli.format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) if err.is::<Reported>() => ExitCode::FAILURE,
    Err(err) => {
      if cli.format.is_json() {
        let _ = print_json(&serde_json::json!({
          "errors": [{ "kind": "Error", "message": format!("{err:#}") }]
        }));
      } else {
        print_error(&format!("{err:#}"));
      }
      ExitCode::FAILURE
    }
  }
}
