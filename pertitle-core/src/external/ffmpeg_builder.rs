//! FFmpeg command construction for measurement encodes and quality scoring.
//!
//! All measurement encodes share the same shape: input seeking to the window
//! start, no audio, 4:2:0 output at the tier resolution and a fixed IDR
//! interval. Only the rate control differs between CRF and CBR encodes.

use crate::media::{MetricKind, Resolution, TimeWindow};
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Rate control of a measurement encode.
#[derive(Debug, Clone, PartialEq)]
pub enum RateControl<'a> {
    /// Constant quality with an x264 preset.
    Crf { quality: u8, preset: &'a str },
    /// Target bitrate with the given video codec.
    Cbr { bitrate: u64, codec: &'a str },
}

/// Parameters shared by every measurement encode.
#[derive(Debug, Clone)]
pub struct EncodeSpec<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub resolution: Resolution,
    pub idr_interval_frames: u32,
    pub window: TimeWindow,
    pub rate_control: RateControl<'a>,
}

/// Builds an encode command for one measurement window.
#[must_use]
pub fn build_encode_command(spec: &EncodeSpec<'_>) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.arg("-hide_banner");
    cmd.arg("-nostats");
    cmd.args(["-loglevel", "error"]);

    cmd.arg("-ss");
    cmd.arg(format!("{:.3}", spec.window.start));
    cmd.input(spec.input.to_string_lossy().as_ref());
    cmd.arg("-t");
    cmd.arg(format!("{:.3}", spec.window.duration()));

    match &spec.rate_control {
        RateControl::Crf { quality, preset } => {
            cmd.args(["-c:v", "libx264"]);
            cmd.args(["-preset", *preset]);
            cmd.arg("-crf");
            cmd.arg(quality.to_string());
        }
        RateControl::Cbr { bitrate, codec } => {
            cmd.args(["-c:v", *codec]);
            cmd.arg("-b:v");
            cmd.arg(bitrate.to_string());
        }
    }

    cmd.arg("-an");
    cmd.args(["-pix_fmt", "yuv420p"]);
    cmd.arg("-s");
    cmd.arg(spec.resolution.to_string());
    cmd.arg("-x264opts");
    cmd.arg(format!("keyint={}", spec.idr_interval_frames));
    cmd.arg("-y");
    cmd.output(spec.output.to_string_lossy().as_ref());
    cmd
}

/// Filter graph scaling the candidate to the reference resolution before comparison.
#[must_use]
pub fn metric_filter_graph(kind: MetricKind, reference_resolution: Resolution) -> String {
    format!(
        "[0]scale={}:{}[scaled];[scaled][1]{}",
        reference_resolution.width,
        reference_resolution.height,
        kind.filter_name()
    )
}

/// Builds the comparison command. The metric summary is printed to the log.
#[must_use]
pub fn build_score_command(
    kind: MetricKind,
    candidate: &Path,
    reference: &Path,
    reference_resolution: Resolution,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.arg("-hide_banner");
    cmd.arg("-nostats");
    cmd.input(candidate.to_string_lossy().as_ref());
    cmd.input(reference.to_string_lossy().as_ref());
    cmd.arg("-lavfi");
    cmd.arg(metric_filter_graph(kind, reference_resolution));
    cmd.args(["-f", "null"]);
    cmd.output("-");
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(mut cmd: FfmpegCommand) -> Vec<String> {
        cmd.as_inner()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_after(args: &[String], flag: &str) -> String {
        let pos = args.iter().position(|a| a == flag).unwrap();
        args[pos + 1].clone()
    }

    #[test]
    fn test_crf_command() {
        let spec = EncodeSpec {
            input: Path::new("/media/in.mkv"),
            output: Path::new("/tmp/out.mp4"),
            resolution: Resolution::new(1920, 1080),
            idr_interval_frames: 48,
            window: TimeWindow::new(30.0, 45.5),
            rate_control: RateControl::Crf {
                quality: 23,
                preset: "ultrafast",
            },
        };
        let args = args(build_encode_command(&spec));

        assert_eq!(value_after(&args, "-ss"), "30.000");
        assert_eq!(value_after(&args, "-t"), "15.500");
        assert_eq!(value_after(&args, "-crf"), "23");
        assert_eq!(value_after(&args, "-preset"), "ultrafast");
        assert_eq!(value_after(&args, "-s"), "1920x1080");
        assert_eq!(value_after(&args, "-x264opts"), "keyint=48");
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-b:v".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input, "seek must precede the input");
    }

    #[test]
    fn test_cbr_command() {
        let spec = EncodeSpec {
            input: Path::new("in.mkv"),
            output: Path::new("out.mp4"),
            resolution: Resolution::new(640, 360),
            idr_interval_frames: 50,
            window: TimeWindow::new(0.0, 120.0),
            rate_control: RateControl::Cbr {
                bitrate: 800_000,
                codec: "libx264",
            },
        };
        let args = args(build_encode_command(&spec));

        assert_eq!(value_after(&args, "-b:v"), "800000");
        assert_eq!(value_after(&args, "-c:v"), "libx264");
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_score_command() {
        let args = args(build_score_command(
            MetricKind::Psnr,
            Path::new("candidate.mp4"),
            Path::new("source.mkv"),
            Resolution::new(1920, 1080),
        ));
        assert_eq!(
            value_after(&args, "-lavfi"),
            "[0]scale=1920:1080[scaled];[scaled][1]psnr"
        );
        assert_eq!(value_after(&args, "-f"), "null");
    }
}
