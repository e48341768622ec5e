//! Core library for per-title encoding ladder optimization.
//!
//! This crate models an adaptive-streaming encoding ladder and decides, for
//! one title, which bitrate each tier should be encoded at. Two optimizers are
//! available:
//!
//! - **CRF statistical analysis**: constant-quality encodes of equal-length
//!   segments are probed for their bitrate; an outlier-aware weighted average
//!   of those bitrates is projected onto every tier.
//! - **Metric sweep**: every tier is encoded at a range of constant bitrates
//!   and scored against the source; the knee of each bitrate/quality curve is
//!   that tier's bitrate.
//!
//! Encoding, probing and scoring are external collaborators behind the traits
//! in [`external`]; the ffmpeg/ffprobe adapters are provided.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pertitle_core::analysis::{MetricSweepParams, PerTitleAnalyzer};
//! use pertitle_core::config::{CoreConfigBuilder, default_template_ladder};
//! use pertitle_core::external::{FfmpegEncoder, FfmpegQualityScorer, FfprobeProber, Toolchain};
//! use std::path::Path;
//!
//! # fn main() -> pertitle_core::CoreResult<()> {
//! let config = CoreConfigBuilder::new().parallel(true).build();
//! let work_dir = pertitle_core::create_temp_dir(&config, "pertitle")?;
//!
//! let prober = FfprobeProber::new();
//! let encoder = FfmpegEncoder::new(work_dir.path(), &config);
//! let scorer = FfmpegQualityScorer::new(&config);
//! let toolchain = Toolchain::new(&prober, &encoder, &encoder, &scorer);
//!
//! let mut analyzer = PerTitleAnalyzer::new(
//!     Path::new("/path/to/title.mp4"),
//!     default_template_ladder().build()?,
//!     toolchain,
//!     config.clone(),
//! )?;
//! analyzer.run_metric_sweep(&MetricSweepParams::for_config(&config))?;
//! analyzer.session().save(Path::new("title.json"))?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod events;
pub mod external;
pub mod ladder;
pub mod media;
pub mod reporting;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use analysis::{CrfAnalysisParams, MetricSweepParams, PerTitleAnalyzer};
pub use config::{CoreConfig, CoreConfigBuilder, LadderConfig};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler};
pub use external::{
    ConstantBitrateEncoder, ConstantQualityEncoder, Prober, QualityScorer, Toolchain,
};
pub use ladder::{EncodingLadder, EncodingProfile};
pub use media::{MetricKind, ProbeInfo, Resolution, TimeWindow};
pub use reporting::{AnalysisResult, AnalysisSession, CrfMode, TierPlan};
pub use temp_files::{TempArtifact, create_temp_dir, create_temp_file_path};
pub use utils::{format_bitrate, format_duration};
