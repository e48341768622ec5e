//! ffmpeg-backed quality scorer (SSIM / PSNR).

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::QualityScorer;
use super::ffmpeg_builder::build_score_command;
use super::ffmpeg_executor::{FfmpegSpawner, SidecarSpawner, run_ffmpeg};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::media::{MetricKind, Resolution};

static SSIM_ALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SSIM\b.*\bAll:\s*([0-9]+(?:\.[0-9]+)?)").expect("SSIM summary pattern is valid")
});
static PSNR_AVERAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PSNR\b.*\baverage:\s*([0-9]+(?:\.[0-9]+)?|inf)").expect("PSNR summary pattern is valid")
});

/// PSNR reported for identical frames, where ffmpeg prints `inf`.
pub const MAX_PSNR_DB: f64 = 100.0;

/// Extracts the summary value of `kind` from ffmpeg log lines.
///
/// The last matching line wins.
pub fn parse_metric_value(kind: MetricKind, lines: &[String]) -> Option<f64> {
    let pattern = match kind {
        MetricKind::Ssim => &*SSIM_ALL,
        MetricKind::Psnr => &*PSNR_AVERAGE,
    };

    lines
        .iter()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .last()
        .map(|value| if value.is_infinite() { MAX_PSNR_DB } else { value })
}

/// Scores a candidate against a reference with ffmpeg's ssim/psnr filters.
#[derive(Debug, Clone)]
pub struct FfmpegQualityScorer<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
    timeout: Option<Duration>,
}

impl FfmpegQualityScorer<SidecarSpawner> {
    pub fn new(config: &CoreConfig) -> Self {
        Self::with_spawner(SidecarSpawner, config)
    }
}

impl<S: FfmpegSpawner> FfmpegQualityScorer<S> {
    pub fn with_spawner(spawner: S, config: &CoreConfig) -> Self {
        Self {
            spawner,
            timeout: config.measurement_timeout,
        }
    }
}

impl<S: FfmpegSpawner> QualityScorer for FfmpegQualityScorer<S> {
    fn score(
        &self,
        kind: MetricKind,
        candidate: &Path,
        reference: &Path,
        reference_resolution: Resolution,
    ) -> CoreResult<f64> {
        let operation = format!("ffmpeg ({kind} score)");
        let cmd = build_score_command(kind, candidate, reference, reference_resolution);

        let lines = run_ffmpeg(&self.spawner, cmd, &operation, self.timeout).map_err(|e| match e {
            CoreError::Timeout { .. } => e,
            other => CoreError::Score(other.to_string()),
        })?;

        let value = parse_metric_value(kind, &lines).ok_or_else(|| {
            CoreError::Score(format!(
                "No {} summary found in ffmpeg output for {}",
                kind.to_string().to_uppercase(),
                candidate.display()
            ))
        })?;
        log::debug!("{} of {}: {}", kind, candidate.display(), value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_ssim_summary() {
        let log = lines(&[
            "Stream mapping:",
            "[Parsed_ssim_1 @ 0x55d4c] SSIM Y:0.987654 (19.082) U:0.991 (20.4) V:0.990 (20.0) All:0.988321 (19.324)",
        ]);
        assert_eq!(parse_metric_value(MetricKind::Ssim, &log), Some(0.988321));
        assert_eq!(parse_metric_value(MetricKind::Psnr, &log), None);
    }

    #[test]
    fn test_parse_psnr_summary() {
        let log = lines(&[
            "[Parsed_psnr_1 @ 0x7f] PSNR y:41.02 u:44.90 v:45.12 average:42.118371 min:38.55 max:47.90",
        ]);
        assert_eq!(parse_metric_value(MetricKind::Psnr, &log), Some(42.118371));
    }

    #[test]
    fn test_parse_psnr_identical_frames() {
        let log = lines(&[
            "[Parsed_psnr_1 @ 0x7f] PSNR y:inf u:inf v:inf average:inf min:inf max:inf",
        ]);
        assert_eq!(parse_metric_value(MetricKind::Psnr, &log), Some(MAX_PSNR_DB));

        let ssim = lines(&["[Parsed_ssim_1 @ 0x1] SSIM Y:1.000000 (inf) U:1.000000 (inf) V:1.000000 (inf) All:1.000000 (inf)"]);
        assert_eq!(parse_metric_value(MetricKind::Ssim, &ssim), Some(1.0));
    }

    #[test]
    fn test_parse_missing_summary() {
        let log = lines(&["frame=  250 fps=120 q=-0.0 Lsize=N/A time=00:00:10.00"]);
        assert_eq!(parse_metric_value(MetricKind::Ssim, &log), None);
    }
}
