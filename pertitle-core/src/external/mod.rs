// ============================================================================
// pertitle-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Measurement Collaborators and Their ffmpeg Adapters
//
// The decision engine never talks to a codec directly. It consumes four
// collaborator contracts defined here and receives concrete implementations
// through a Toolchain. The ffmpeg/ffprobe adapters in the submodules are the
// production implementations; tests substitute fakes.
//
// KEY COMPONENTS:
// - Prober, ConstantQualityEncoder, ConstantBitrateEncoder, QualityScorer
// - Toolchain: borrowed bundle of one implementation of each
// - FfprobeProber, FfmpegEncoder, FfmpegQualityScorer: production adapters
// - check_dependency: verifies an external binary can be started

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::media::{MetricKind, ProbeInfo, Resolution, TimeWindow};

// ---- Standard library imports ----
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Measurement encoders backed by ffmpeg
pub mod encoder;

/// Command construction for encodes and scoring
pub mod ffmpeg_builder;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Media probing backed by ffprobe
pub mod ffprobe_executor;

/// SSIM/PSNR scoring backed by ffmpeg
pub mod scorer;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use encoder::FfmpegEncoder;
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, LogCapture, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::FfprobeProber;
pub use scorer::FfmpegQualityScorer;

// ============================================================================
// COLLABORATOR CONTRACTS
// ============================================================================

/// Reads technical metadata from a media file.
pub trait Prober: Send + Sync {
    /// Fails with `CoreError::Probe` when the file is unreadable or has no video stream.
    fn probe(&self, path: &Path) -> CoreResult<ProbeInfo>;
}

/// Produces a constant-quality encode of one time window.
pub trait ConstantQualityEncoder: Send + Sync {
    /// Returns the path of a new temporary artifact owned by the caller.
    fn encode_crf(
        &self,
        input: &Path,
        resolution: Resolution,
        quality: u8,
        idr_interval_frames: u32,
        window: TimeWindow,
    ) -> CoreResult<PathBuf>;
}

/// Produces a constant-bitrate encode of one time window.
pub trait ConstantBitrateEncoder: Send + Sync {
    /// Returns the path of a new temporary artifact owned by the caller.
    fn encode_cbr(
        &self,
        input: &Path,
        resolution: Resolution,
        bitrate: u64,
        idr_interval_frames: u32,
        window: TimeWindow,
    ) -> CoreResult<PathBuf>;
}

/// Computes an objective quality score of a candidate against a reference.
pub trait QualityScorer: Send + Sync {
    /// The candidate is scaled to `reference_resolution` before comparison.
    fn score(
        &self,
        kind: MetricKind,
        candidate: &Path,
        reference: &Path,
        reference_resolution: Resolution,
    ) -> CoreResult<f64>;
}

/// The collaborators an analysis runs against.
#[derive(Clone, Copy)]
pub struct Toolchain<'a> {
    pub prober: &'a dyn Prober,
    pub crf_encoder: &'a dyn ConstantQualityEncoder,
    pub cbr_encoder: &'a dyn ConstantBitrateEncoder,
    pub scorer: &'a dyn QualityScorer,
}

impl<'a> Toolchain<'a> {
    pub fn new(
        prober: &'a dyn Prober,
        crf_encoder: &'a dyn ConstantQualityEncoder,
        cbr_encoder: &'a dyn ConstantBitrateEncoder,
        scorer: &'a dyn QualityScorer,
    ) -> Self {
        Self {
            prober,
            crf_encoder,
            cbr_encoder,
            scorer,
        }
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd_name> -version` with its output discarded.
///
/// # Returns
///
/// * `Ok(())` - If the command could be started
/// * `Err(CoreError::DependencyNotFound)` - If the command is not on the PATH
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency() {
        match check_dependency("pertitle-definitely-not-a-real-binary") {
            Err(CoreError::DependencyNotFound(name)) => {
                assert_eq!(name, "pertitle-definitely-not-a-real-binary")
            }
            other => panic!("expected DependencyNotFound, got {other:?}"),
        }
    }
}
