// pertitle-cli/src/lib.rs
//
// Library portion of the pertitle CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{AnalysisArgs, Cli, Commands, CrfArgs, LadderArgs, MetricArgs};
pub use commands::crf::run_crf;
pub use commands::ladder::run_ladder;
pub use commands::metric::run_metric;
pub use error::{CliErrorContext, CliResult};
