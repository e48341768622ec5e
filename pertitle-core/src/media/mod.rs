//! Media value types shared by the optimizers and the collaborator adapters.
//!
//! This module holds the small, copyable descriptions of media that flow
//! between the decision engine and the external tools: resolutions, time
//! windows on the source timeline, probe results and quality metric kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A video resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels per frame.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    /// Parses `"1920x1080"` (an upper-case `X` is accepted as well).
    fn from_str(s: &str) -> CoreResult<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| CoreError::Configuration(format!("Invalid resolution '{s}', expected WIDTHxHEIGHT")))?;

        let parse = |part: &str| -> CoreResult<u32> {
            match part.trim().parse::<u32>() {
                Ok(v) if v > 0 => Ok(v),
                _ => Err(CoreError::Configuration(format!(
                    "Invalid resolution '{s}': dimensions must be positive integers"
                ))),
            }
        };

        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

/// A half-open interval `[start, end)` on the source timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Technical metadata returned by a [`Prober`](crate::external::Prober).
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    /// Duration in seconds.
    pub duration: f64,
    /// Frames per second, rounded to an integer.
    pub framerate: u32,
    pub width: u32,
    pub height: u32,
    /// Video bitrate in bits per second, when the container or stream reports one.
    pub bitrate: Option<u64>,
}

impl ProbeInfo {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Converts an IDR interval in seconds into a frame count at this framerate.
    pub fn idr_interval_frames(&self, idr_interval_secs: u32) -> u32 {
        idr_interval_secs.saturating_mul(self.framerate)
    }
}

/// Objective quality metrics understood by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Ssim,
    Psnr,
}

impl MetricKind {
    /// Name of the matching ffmpeg filter.
    pub fn filter_name(&self) -> &'static str {
        match self {
            MetricKind::Ssim => "ssim",
            MetricKind::Psnr => "psnr",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filter_name())
    }
}

impl FromStr for MetricKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssim" => Ok(MetricKind::Ssim),
            "psnr" => Ok(MetricKind::Psnr),
            _ => Err(CoreError::UnsupportedMetric(s.to_string())),
        }
    }
}
