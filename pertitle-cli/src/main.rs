// pertitle-cli/src/main.rs
//
// Entry point of the `pertitle` binary.
//
// Responsibilities include:
// - Parsing user-provided arguments.
// - Setting up colors and logging (console and optional log file).
// - Dispatching to the subcommand implementations.
// - Printing errors and managing the process exit code.

use clap::Parser;
use log::info;
use pertitle_cli::{Cli, CliResult, Commands, logging, run_crf, run_ladder, run_metric, terminal};
use std::path::Path;
use std::process;

fn init_logging(command: &str, log_dir: Option<&Path>, verbose: bool) -> CliResult<()> {
    if let Some(path) = logging::setup_logging(command, log_dir, verbose)? {
        info!("Logging to {}", path.display());
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Crf(args) => {
            init_logging("crf", args.analysis.log_dir.as_deref(), cli.verbose)?;
            run_crf(args)
        }
        Commands::Metric(args) => {
            init_logging("metric", args.analysis.log_dir.as_deref(), cli.verbose)?;
            run_metric(args)
        }
        Commands::Ladder(args) => {
            init_logging("ladder", None, cli.verbose)?;
            run_ladder(args)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.no_color {
        terminal::set_color(false);
    }

    if let Err(err) = run(cli) {
        terminal::print_error(&format!("{err:#}"));
        process::exit(1);
    }
}
