//! Implementation of the 'crf' subcommand.
//!
//! Encodes equal-length segments of the input at a constant rate factor,
//! reduces their bitrates to one weighted optimum and maps it onto the ladder.

use crate::cli::CrfArgs;
use crate::commands::{report, run_analysis};
use crate::error::CliResult;

use log::info;
use pertitle_core::CrfAnalysisParams;

/// Builds the core parameters from the command-line flags.
pub fn crf_params(args: &CrfArgs) -> CrfAnalysisParams {
    CrfAnalysisParams {
        segments: args.segments,
        crf: args.crf,
        idr_interval_secs: args.analysis.idr_interval,
        reference: args.reference,
        mode: args.mode.into(),
    }
}

pub fn run_crf(args: CrfArgs) -> CliResult<()> {
    let params = crf_params(&args);
    info!(
        "CRF {} over {} segments ({} mode)",
        params.crf, params.segments, params.mode
    );

    let (result, session_path) = run_analysis(&args.analysis, |analyzer| {
        analyzer.run_crf_analysis(&params).cloned()
    })?;
    report(&args.analysis, &result, &session_path);
    Ok(())
}
