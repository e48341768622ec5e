//! FFprobe integration for media analysis.
//!
//! This module reads duration, framerate, resolution and video bitrate from a
//! media file with the `ffprobe` crate. It serves both the source probe at
//! the start of a run and the bitrate probe of every CRF artifact.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error, probe_error};
use crate::media::ProbeInfo;
use crate::utils::parse_frame_rate;
use ffprobe::{FfProbe, FfProbeError, ffprobe};
use std::path::Path;

use super::Prober;

/// [`Prober`] backed by the ffprobe binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber;

impl FfprobeProber {
    pub fn new() -> Self {
        Self
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeInfo> {
        log::debug!("Running ffprobe (via crate) on: {}", path.display());
        match ffprobe(path) {
            Ok(metadata) => probe_info_from_metadata(path, &metadata),
            Err(err) => {
                log::error!("ffprobe failed on {}: {:?}", path.display(), err);
                Err(probe_error(path, map_ffprobe_error(err, "probe")))
            }
        }
    }
}

/// Extracts [`ProbeInfo`] from parsed ffprobe output.
fn probe_info_from_metadata(path: &Path, metadata: &FfProbe) -> CoreResult<ProbeInfo> {
    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| probe_error(path, "no video stream found"))?;

    let width = video_stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| probe_error(path, "video stream has no usable width"))?;
    let height = video_stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| probe_error(path, "video stream has no usable height"))?;

    let duration = metadata
        .format
        .duration
        .as_deref()
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| probe_error(path, "missing or invalid duration"))?;

    let framerate = parse_frame_rate(&video_stream.r_frame_rate)
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .map(|fps| fps.round() as u32)
        .ok_or_else(|| {
            probe_error(
                path,
                format!("invalid frame rate '{}'", video_stream.r_frame_rate),
            )
        })?;

    let bitrate = video_stream
        .bit_rate
        .as_deref()
        .or(metadata.format.bit_rate.as_deref())
        .and_then(|b| b.parse::<u64>().ok());

    Ok(ProbeInfo {
        duration,
        framerate,
        width: width as u32,
        height: height as u32,
        bitrate,
    })
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::Json(err),
        _ => CoreError::Probe(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_file_is_probe_error() {
        let err = FfprobeProber::new()
            .probe(Path::new("/nonexistent/pertitle/input.mkv"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Probe(_)));
        assert!(err.to_string().contains("/nonexistent/pertitle/input.mkv"));
    }
}
