// pertitle-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use pertitle_core::media::{MetricKind, Resolution};
use pertitle_core::reporting::CrfMode;
use std::path::PathBuf;

use crate::config::{
    DEFAULT_BITRATE_STEP, DEFAULT_CRF, DEFAULT_IDR_INTERVAL_SECS, DEFAULT_METRIC_THRESHOLD,
    DEFAULT_SEGMENTS,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Pertitle: per-title encoding ladder analysis",
    long_about = "Decides per-title bitrates for an encoding ladder using CRF statistics \
                  or metric sweeps, via the pertitle-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored terminal output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derives the ladder from CRF-encoded segment bitrates
    Crf(CrfArgs),
    /// Sweeps each tier's bitrate range and picks the quality knee
    Metric(MetricArgs),
    /// Prints or exports the encoding ladder
    Ladder(LadderArgs),
}

/// Arguments shared by both analysis subcommands.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Source video to analyze
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Ladder configuration file (JSON); defaults to the built-in template
    #[arg(short = 'L', long = "ladder", value_name = "LADDER_FILE")]
    pub ladder: Option<PathBuf>,

    /// Session file to write; an existing session is appended to
    /// (defaults to INPUT_FILE with a .pertitle.json extension)
    #[arg(short = 'o', long = "output", value_name = "SESSION_FILE")]
    pub output: Option<PathBuf>,

    /// Directory for log files (console logging only when absent)
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Base directory for temporary measurement encodes
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// IDR interval in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_IDR_INTERVAL_SECS,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub idr_interval: u32,

    /// Kill any encode or score that runs longer than this
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Measure segments and tiers concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Emit progress as JSON lines on stdout instead of a progress bar
    #[arg(long)]
    pub json_progress: bool,
}

#[derive(Args, Debug)]
pub struct CrfArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Number of equal-length segments to encode
    #[arg(short = 'n', long, value_name = "COUNT", default_value_t = DEFAULT_SEGMENTS,
          value_parser = parse_segments)]
    pub segments: usize,

    /// Constant rate factor of the sampling encodes (0-51)
    #[arg(long, value_name = "CRF", default_value_t = DEFAULT_CRF,
          value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: u8,

    /// Reference resolution for linear mode, e.g. 1920x1080 (defaults to the top tier)
    #[arg(long, value_name = "WxH")]
    pub reference: Option<Resolution>,

    /// How measurements map onto the ladder
    #[arg(long, value_enum, default_value_t = CrfModeArg::Linear)]
    pub mode: CrfModeArg,
}

#[derive(Args, Debug)]
pub struct MetricArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Quality metric (ssim or psnr)
    #[arg(short, long, value_name = "METRIC", default_value = "ssim")]
    pub metric: MetricKind,

    /// Minimum quality gain per bitrate step (about 0.005 for SSIM, 0.1 for PSNR)
    #[arg(short, long, value_name = "VALUE", default_value_t = DEFAULT_METRIC_THRESHOLD)]
    pub threshold: f64,

    /// Global sweep step in bits per second
    #[arg(short, long, value_name = "BPS", default_value_t = DEFAULT_BITRATE_STEP,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub step: u64,

    /// Use each tier's own bitrate_step when the ladder defines one
    #[arg(long)]
    pub individual_steps: bool,
}

#[derive(Args, Debug)]
pub struct LadderArgs {
    /// Ladder configuration file to validate and display
    #[arg(short = 'L', long = "ladder", value_name = "LADDER_FILE")]
    pub ladder: Option<PathBuf>,

    /// Print the ladder as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write the ladder as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<PathBuf>,
}

/// CRF mapping modes as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrfModeArg {
    /// Sample the reference resolution and scale onto every tier
    Linear,
    /// Sample every tier at its own resolution
    EncodeForEach,
}

impl From<CrfModeArg> for CrfMode {
    fn from(mode: CrfModeArg) -> Self {
        match mode {
            CrfModeArg::Linear => CrfMode::Linear,
            CrfModeArg::EncodeForEach => CrfMode::PerProfile,
        }
    }
}

fn parse_segments(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err("at least one segment is required".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
