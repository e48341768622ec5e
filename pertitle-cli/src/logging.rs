// ============================================================================
// pertitle-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and File Dispatch
//
// The CLI logs through the standard `log` facade with `fern` as the backend.
// Messages go to stderr (plain for info, tagged for warnings and errors) and,
// when a log directory is given, to a timestamped file with full records.
//
// LEVELS:
// - Info by default, Debug with --verbose
// - ffmpeg-sidecar is capped at Warn
//
// AI-ASSISTANT-INFO: Logging setup and helper functions

// ---- External crate imports ----
use console::style;
use log::{Level, LevelFilter};

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("pertitle_crf_{}.log", pertitle_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for one run of `command` inside `log_dir`.
pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("pertitle_{}_{}.log", command, get_timestamp()))
}

/// Installs the global logger. Returns the log file path when one is written.
pub fn setup_logging(command: &str, log_dir: Option<&Path>, verbose: bool) -> CliResult<Option<PathBuf>> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let console = fern::Dispatch::new()
        .format(|out, message, record| match record.level() {
            Level::Error => out.finish(format_args!("{} {}", style("error:").red().bold(), message)),
            Level::Warn => out.finish(format_args!("{} {}", style("warning:").yellow().bold(), message)),
            Level::Info => out.finish(format_args!("{message}")),
            _ => out.finish(format_args!("{} {}", style(record.level()).dim(), message)),
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("ffmpeg_sidecar", LevelFilter::Warn)
        .chain(console);

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .cli_with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
            let path = log_file_path(dir, command);
            let file = fern::log_file(&path)
                .cli_with_context(|| format!("Failed to create log file '{}'", path.display()))?;
            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "[{} {:<5} {}] {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .chain(file),
            );
            Some(path)
        }
        None => None,
    };

    dispatch.apply()?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_log_file_path() {
        let path = log_file_path(Path::new("/var/log/pertitle"), "metric");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pertitle_metric_"));
        assert!(name.ends_with(".log"));
        assert_eq!(path.parent(), Some(Path::new("/var/log/pertitle")));
    }
}
