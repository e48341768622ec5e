//! Implementation of the 'ladder' subcommand.
//!
//! Validates a ladder file (or the built-in template) and shows it as a table
//! or JSON, optionally writing it out as a starting point for a custom ladder.

use crate::cli::LadderArgs;
use crate::commands::load_ladder;
use crate::error::{CliErrorContext, CliResult};
use crate::terminal;

use pertitle_core::config::LadderConfig;

use std::fs;

pub fn run_ladder(args: LadderArgs) -> CliResult<()> {
    let ladder = load_ladder(args.ladder.as_deref())?;
    let json = LadderConfig::from(&ladder)
        .to_json()
        .cli_context("Failed to serialize ladder")?;

    if let Some(path) = &args.write {
        fs::write(path, format!("{json}\n"))
            .cli_with_context(|| format!("Failed to write ladder file '{}'", path.display()))?;
        if !args.json {
            terminal::print_success(&format!("Ladder written to {}", path.display()));
        }
    }

    if args.json {
        println!("{json}");
    } else {
        let title = match &args.ladder {
            Some(path) => format!("Ladder {}", path.display()),
            None => "Template ladder".to_string(),
        };
        terminal::print_section(&title);
        terminal::print_ladder(&ladder);
    }
    Ok(())
}
