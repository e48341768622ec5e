//! Implementation of the 'metric' subcommand.
//!
//! Sweeps every tier from its minimum to its maximum bitrate, scores each
//! constant-bitrate encode against the source and keeps the knee of each curve.

use crate::cli::MetricArgs;
use crate::commands::{report, run_analysis};
use crate::error::CliResult;

use anyhow::bail;
use log::info;
use pertitle_core::MetricSweepParams;
use pertitle_core::analysis::metric::StepConfig;

/// Builds the core parameters from the command-line flags.
pub fn metric_params(args: &MetricArgs) -> CliResult<MetricSweepParams> {
    if !args.threshold.is_finite() || args.threshold < 0.0 {
        bail!("Threshold must be a non-negative number, got {}", args.threshold);
    }
    Ok(MetricSweepParams {
        metric: args.metric,
        threshold: args.threshold,
        steps: StepConfig {
            default_step: args.step,
            individual: args.individual_steps,
        },
        idr_interval_secs: args.analysis.idr_interval,
    })
}

pub fn run_metric(args: MetricArgs) -> CliResult<()> {
    let params = metric_params(&args)?;
    info!(
        "{} sweep, threshold {}, step {} bps{}",
        params.metric,
        params.threshold,
        params.steps.default_step,
        if params.steps.individual { " (per-tier steps)" } else { "" }
    );

    let (result, session_path) = run_analysis(&args.analysis, |analyzer| {
        analyzer.run_metric_sweep(&params).cloned()
    })?;
    report(&args.analysis, &result, &session_path);
    Ok(())
}
