mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing::info_span;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::metadata::RunId;
use crate::output::Report;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing();

    let run_id = RunId::new_v4();
    let span = info_span!("run", run_id = %run_id);
    let _entered = span.enter();

    let (command, result) = commands::run(&cli)?;
    let report = Report {
        run_id,
        command,
        warnings: result.warnings,
        data: result.data,
    };
    output::render(&report, cli.format, cli.pretty)
}

/// Log to stderr so stdout carries only the report. `RUST_LOG` overrides the default `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
