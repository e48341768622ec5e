//! Configuration structures and constants for the pertitle-core library.
//!
//! This module provides the runtime configuration for the analyzer and its
//! collaborator adapters (work directory, measurement deadline, parallelism,
//! encoder settings) together with the default analysis parameters and the
//! ladder configuration file format.

mod builder;
pub mod ladder_file;

use std::path::PathBuf;
use std::time::Duration;

pub use builder::CoreConfigBuilder;
pub use ladder_file::{LadderConfig, default_template_ladder};

use crate::error::{CoreError, CoreResult};
use crate::media::MetricKind;

// Default constants

/// Default constant rate factor for CRF sampling (x264 scale, 0-51).
pub const DEFAULT_CRF: u8 = 23;

/// Default number of equal-length segments measured by a CRF analysis.
pub const DEFAULT_SEGMENTS: usize = 10;

/// Default IDR interval in seconds, held fixed across all measurements.
pub const DEFAULT_IDR_INTERVAL_SECS: u32 = 2;

/// Default x264 preset for CRF sampling encodes.
pub const DEFAULT_CRF_PRESET: &str = "ultrafast";

/// Default video codec for constant-bitrate encodes.
pub const DEFAULT_CBR_VIDEO_CODEC: &str = "libx264";

/// Default bitrate step of a metric sweep, in bits per second.
pub const DEFAULT_BITRATE_STEP: u64 = 100_000;

/// Default quality metric of a metric sweep.
pub const DEFAULT_METRIC: MetricKind = MetricKind::Ssim;

/// Default knee threshold: minimum quality gain per bitrate step.
/// Around 0.005 suits SSIM with a 100 kbps step; PSNR needs roughly 0.1.
pub const DEFAULT_METRIC_THRESHOLD: f64 = 0.005;

/// Runtime configuration for the analyzer and the ffmpeg/ffprobe adapters.
///
/// # Examples
///
/// ```rust
/// use pertitle_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .measurement_timeout(Duration::from_secs(600))
///     .parallel(true)
///     .build();
/// assert!(config.parallel);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Base directory for measurement artifacts (defaults to the system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Deadline applied to every external encode or score process
    pub measurement_timeout: Option<Duration>,

    /// Measure CRF windows and metric tiers concurrently
    pub parallel: bool,

    /// x264 preset used by CRF sampling encodes
    pub crf_preset: String,

    /// Video codec used by constant-bitrate encodes
    pub cbr_video_codec: String,

    /// Global bitrate step of a metric sweep
    pub default_bitrate_step: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            measurement_timeout: None,
            parallel: false,
            crf_preset: DEFAULT_CRF_PRESET.to_string(),
            cbr_video_codec: DEFAULT_CBR_VIDEO_CODEC.to_string(),
            default_bitrate_step: DEFAULT_BITRATE_STEP,
        }
    }
}

impl CoreConfig {
    /// Checks the configuration for values no measurement could run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.crf_preset.trim().is_empty() {
            return Err(CoreError::Configuration("CRF preset must not be empty".to_string()));
        }
        if self.cbr_video_codec.trim().is_empty() {
            return Err(CoreError::Configuration("CBR video codec must not be empty".to_string()));
        }
        if self.default_bitrate_step == 0 {
            return Err(CoreError::Configuration("Default bitrate step must be positive".to_string()));
        }
        if self.measurement_timeout == Some(Duration::ZERO) {
            return Err(CoreError::Configuration("Measurement timeout must be positive".to_string()));
        }
        Ok(())
    }
}
