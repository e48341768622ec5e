// ============================================================================
// pertitle-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Typed Failures for the Bitrate Decision Engine
//
// This module defines the error taxonomy used throughout pertitle-core.
// Collaborator failures (probe, encode, score) are surfaced to the caller as
// typed variants; nothing is retried or swallowed inside the core.
//
// KEY COMPONENTS:
// - CoreError: The error enum for every fallible operation
// - CoreResult: Result alias used across the crate
// - Helper constructors for external command failures

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by the ladder model, the optimizers and the adapters.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid or empty ladder, invalid analysis parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The prober could not read the file or found no usable video stream.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An encode for a measurement window failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The quality scorer failed to produce a value.
    #[error("Score error: {0}")]
    Score(String),

    /// Weighted statistics collapsed to an all-zero weight sum.
    #[error("Degenerate statistics: {0}")]
    DegenerateStatistics(String),

    #[error("Unsupported metric '{0}': expected \"ssim\" or \"psnr\"")]
    UnsupportedMetric(String),

    /// An external measurement did not finish before its deadline.
    #[error("{operation} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { operation: String, timeout: Duration },

    /// A run could not produce any plan (e.g. every metric tier failed).
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] std::io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pertitle-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds a `CommandStart` error for an external tool that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandFailed` error from an exit status and captured stderr.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

/// Builds an error for a failure while waiting on a spawned process.
pub fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(format!("{} (wait)", cmd.into()), err)
}

/// Shorthand for a probe failure tied to a specific path.
pub(crate) fn probe_error(path: &Path, detail: impl std::fmt::Display) -> CoreError {
    CoreError::Probe(format!("{}: {}", path.display(), detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_includes_seconds() {
        let err = CoreError::Timeout {
            operation: "ffmpeg (cbr encode)".to_string(),
            timeout: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "ffmpeg (cbr encode) timed out after 90s");
    }

    #[test]
    fn test_unsupported_metric_message() {
        let err = CoreError::UnsupportedMetric("vmaf".to_string());
        assert!(err.to_string().contains("vmaf"));
        assert!(err.to_string().contains("ssim"));
    }
}
