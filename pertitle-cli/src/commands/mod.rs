//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command. The
//! analysis commands share the setup in this module: ladder loading, core
//! configuration, collaborator adapters and session persistence.

/// The `crf` command: CRF statistical analysis.
pub mod crf;
/// The `ladder` command: display and export of ladders.
pub mod ladder;
/// The `metric` command: metric sweep analysis.
pub mod metric;

use crate::cli::AnalysisArgs;
use crate::config::{WORK_DIR_PREFIX, default_session_path};
use crate::error::{CliErrorContext, CliResult};
use crate::progress::ProgressEventHandler;
use crate::terminal;

use pertitle_core::config::{CoreConfig, CoreConfigBuilder, LadderConfig, default_template_ladder};
use pertitle_core::events::json_handler::JsonProgressHandler;
use pertitle_core::external::{
    FfmpegEncoder, FfmpegQualityScorer, FfprobeProber, Toolchain, check_dependency,
};
use pertitle_core::ladder::EncodingLadder;
use pertitle_core::reporting::{AnalysisResult, AnalysisSession};
use pertitle_core::temp_files::create_temp_dir;
use pertitle_core::{CoreResult, PerTitleAnalyzer};

use anyhow::bail;
use log::{debug, info, warn};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Loads the ladder from `path`, or the built-in template when absent.
pub fn load_ladder(path: Option<&Path>) -> CliResult<EncodingLadder> {
    let config = match path {
        Some(path) => LadderConfig::from_file(path).cli_context("Failed to load ladder")?,
        None => default_template_ladder(),
    };
    config.build().cli_context("Invalid encoding ladder")
}

/// Maps the shared analysis flags onto a CoreConfig.
pub fn create_core_config(args: &AnalysisArgs) -> CliResult<CoreConfig> {
    let mut builder = CoreConfigBuilder::new().parallel(args.parallel);
    if let Some(temp_dir) = &args.temp_dir {
        builder = builder.temp_dir(temp_dir.clone());
    }
    if let Some(secs) = args.timeout {
        builder = builder.measurement_timeout(Duration::from_secs(secs));
    }
    let config = builder.build();
    config.validate().cli_context("Invalid configuration")?;
    Ok(config)
}

/// Loads an existing session at `path` when it belongs to `input`.
fn load_existing_session(path: &Path, input: &Path) -> CliResult<Option<AnalysisSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let session = AnalysisSession::load(path)
        .cli_with_context(|| format!("Failed to read session file '{}'", path.display()))?;
    if session.input_file_path != input {
        warn!(
            "Session file '{}' was written for '{}'; appending anyway",
            path.display(),
            session.input_file_path.display()
        );
    }
    Ok(Some(session))
}

/// Sets up the collaborators, runs one analysis and saves the session.
///
/// `run` receives the analyzer and returns the result it appended.
pub fn run_analysis<F>(args: &AnalysisArgs, run: F) -> CliResult<(AnalysisResult, PathBuf)>
where
    F: FnOnce(&mut PerTitleAnalyzer<'_>) -> CoreResult<AnalysisResult>,
{
    if !args.input.is_file() {
        bail!("Input file '{}' does not exist or is not a file", args.input.display());
    }
    let ladder = load_ladder(args.ladder.as_deref())?;
    let config = create_core_config(args)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_session_path(&args.input));

    for tool in ["ffmpeg", "ffprobe"] {
        check_dependency(tool).cli_with_context(|| format!("{tool} is required"))?;
    }

    let work_dir = create_temp_dir(&config, WORK_DIR_PREFIX)
        .cli_context("Failed to create temporary work directory")?;
    debug!("Measurement encodes go to {}", work_dir.path().display());

    let prober = FfprobeProber::new();
    let encoder = FfmpegEncoder::new(work_dir.path(), &config);
    let scorer = FfmpegQualityScorer::new(&config);
    let toolchain = Toolchain::new(&prober, &encoder, &encoder, &scorer);

    let mut analyzer = PerTitleAnalyzer::new(&args.input, ladder, toolchain, config)
        .cli_context("Failed to set up analysis")?;
    if let Some(session) = load_existing_session(&output, &args.input)? {
        info!(
            "Appending to session '{}' ({} previous analyses)",
            output.display(),
            session.analyses.len()
        );
        analyzer = analyzer.with_session(session).cli_with_context(|| {
            format!(
                "Cannot append to session '{}'; pass --output to start a new session file",
                output.display()
            )
        })?;
    }

    if args.json_progress {
        analyzer.add_event_handler(Arc::new(JsonProgressHandler::new()));
    } else {
        analyzer.add_event_handler(Arc::new(ProgressEventHandler::new()));
    }

    let result = run(&mut analyzer)
        .cli_with_context(|| format!("Analysis of '{}' failed", args.input.display()))?;

    analyzer
        .session()
        .save(&output)
        .cli_with_context(|| format!("Failed to write session file '{}'", output.display()))?;
    Ok((result, output))
}

/// Prints the summary of a finished analysis unless JSON progress is on.
pub fn report(args: &AnalysisArgs, result: &AnalysisResult, session_path: &Path) {
    if args.json_progress {
        return;
    }
    terminal::print_result(result);
    println!();
    terminal::print_success(&format!("Session saved to {}", session_path.display()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn analysis_args(extra: &[&str]) -> AnalysisArgs {
        let mut argv = vec!["pertitle", "crf", "-i", "title.mp4"];
        argv.extend_from_slice(extra);
        match crate::cli::Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Commands::Crf(args) => args.analysis,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_core_config_from_flags() {
        let config =
            create_core_config(&analysis_args(&["--parallel", "--timeout", "90", "--temp-dir", "/tmp/x"]))
                .unwrap();
        assert!(config.parallel);
        assert_eq!(config.measurement_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.temp_dir, Some(PathBuf::from("/tmp/x")));

        let config = create_core_config(&analysis_args(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_load_template_ladder() {
        let ladder = load_ladder(None).unwrap();
        assert_eq!(ladder.profiles().len(), 5);
        assert_eq!(ladder.max_bitrate_default(), 4_500_000);
    }

    #[test]
    fn test_load_missing_ladder_file() {
        let err = load_ladder(Some(Path::new("/nonexistent/ladder.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("Cannot read ladder file"));
    }

    #[test]
    fn test_existing_session_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("title.pertitle.json");
        assert!(load_existing_session(&path, Path::new("title.mp4")).unwrap().is_none());

        let ladder = load_ladder(None).unwrap();
        AnalysisSession::new("title.mp4", &ladder).save(&path).unwrap();
        let session = load_existing_session(&path, Path::new("title.mp4")).unwrap().unwrap();
        assert!(session.analyses.is_empty());
    }
}
