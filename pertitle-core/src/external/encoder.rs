//! ffmpeg-backed measurement encoders.
//!
//! [`FfmpegEncoder`] implements both encoder contracts. Every encode writes a
//! randomly named `.mp4` into the encoder's work directory; the caller owns
//! the returned file. A failed encode never leaves a partial file behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ffmpeg_builder::{EncodeSpec, RateControl, build_encode_command};
use super::ffmpeg_executor::{FfmpegSpawner, SidecarSpawner, run_ffmpeg};
use super::{ConstantBitrateEncoder, ConstantQualityEncoder};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::media::{Resolution, TimeWindow};
use crate::temp_files::{TempArtifact, create_temp_file_path};

/// Encoder producing CRF and CBR measurement artifacts with ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
    work_dir: PathBuf,
    crf_preset: String,
    cbr_video_codec: String,
    timeout: Option<Duration>,
}

impl FfmpegEncoder<SidecarSpawner> {
    pub fn new(work_dir: &Path, config: &CoreConfig) -> Self {
        Self::with_spawner(SidecarSpawner, work_dir, config)
    }
}

impl<S: FfmpegSpawner> FfmpegEncoder<S> {
    pub fn with_spawner(spawner: S, work_dir: &Path, config: &CoreConfig) -> Self {
        Self {
            spawner,
            work_dir: work_dir.to_path_buf(),
            crf_preset: config.crf_preset.clone(),
            cbr_video_codec: config.cbr_video_codec.clone(),
            timeout: config.measurement_timeout,
        }
    }

    fn encode(
        &self,
        operation: &str,
        input: &Path,
        resolution: Resolution,
        idr_interval_frames: u32,
        window: TimeWindow,
        rate_control: RateControl<'_>,
    ) -> CoreResult<PathBuf> {
        let output = create_temp_file_path(&self.work_dir, operation, "mp4");
        let artifact = TempArtifact::adopt(&output);

        let cmd = build_encode_command(&EncodeSpec {
            input,
            output: &output,
            resolution,
            idr_interval_frames,
            window,
            rate_control,
        });

        run_ffmpeg(&self.spawner, cmd, &format!("ffmpeg ({operation} encode)"), self.timeout)
            .map_err(into_encode_error)?;

        if !output.exists() {
            return Err(CoreError::Encode(format!(
                "ffmpeg reported success but produced no file at {}",
                output.display()
            )));
        }
        Ok(artifact.into_path())
    }
}

fn into_encode_error(err: CoreError) -> CoreError {
    match err {
        CoreError::Timeout { .. } | CoreError::Encode(_) => err,
        other => CoreError::Encode(other.to_string()),
    }
}

impl<S: FfmpegSpawner> ConstantQualityEncoder for FfmpegEncoder<S> {
    fn encode_crf(
        &self,
        input: &Path,
        resolution: Resolution,
        quality: u8,
        idr_interval_frames: u32,
        window: TimeWindow,
    ) -> CoreResult<PathBuf> {
        self.encode(
            "crf",
            input,
            resolution,
            idr_interval_frames,
            window,
            RateControl::Crf {
                quality,
                preset: &self.crf_preset,
            },
        )
    }
}

impl<S: FfmpegSpawner> ConstantBitrateEncoder for FfmpegEncoder<S> {
    fn encode_cbr(
        &self,
        input: &Path,
        resolution: Resolution,
        bitrate: u64,
        idr_interval_frames: u32,
        window: TimeWindow,
    ) -> CoreResult<PathBuf> {
        self.encode(
            "cbr",
            input,
            resolution,
            idr_interval_frames,
            window,
            RateControl::Cbr {
                bitrate,
                codec: &self.cbr_video_codec,
            },
        )
    }
}
