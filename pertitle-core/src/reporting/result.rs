//! Analysis result records.
//!
//! An [`AnalysisResult`] is created once at the end of a successful run and
//! never modified afterwards. Every field survives a JSON round trip.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::crf::BitrateStatistics;
use crate::analysis::metric::SweepPoint;
use crate::media::MetricKind;

/// How a CRF analysis maps its measurements onto the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrfMode {
    /// Sample once at the reference resolution and scale onto every tier.
    #[default]
    #[serde(rename = "linear")]
    Linear,
    /// Sample every tier at its own resolution.
    #[serde(rename = "encode_for_each")]
    PerProfile,
}

impl fmt::Display for CrfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrfMode::Linear => f.write_str("linear"),
            CrfMode::PerProfile => f.write_str("encode_for_each"),
        }
    }
}

/// Input parameters of a CRF run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrfParameters {
    /// Reference resolution (linear mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub crf_value: u8,
    pub idr_interval: u32,
    pub number_of_parts: usize,
    pub part_duration: f64,
    pub model: CrfMode,
}

/// Input parameters of a metric sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricParameters {
    pub metric: MetricKind,
    pub threshold: f64,
    pub bitrate_steps: u64,
    pub individual_steps: bool,
    pub idr_interval: u32,
    pub number_of_parts: usize,
    pub part_duration: f64,
}

/// Run parameters, tagged by method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum AnalysisParameters {
    #[serde(rename = "CRF")]
    Crf(CrfParameters),
    #[serde(rename = "Metric")]
    Metric(MetricParameters),
}

impl AnalysisParameters {
    pub fn method(&self) -> &'static str {
        match self {
            AnalysisParameters::Crf(_) => "CRF",
            AnalysisParameters::Metric(_) => "Metric",
        }
    }
}

/// Plan for one tier of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPlan {
    pub width: u32,
    pub height: u32,
    pub bitrate_default: u64,
    /// Chosen bitrate; absent when the tier failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    /// Unclamped CRF projection target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bitrate: Option<u64>,
    /// `false` for elided or failed tiers.
    pub retained: bool,
    /// `bitrate_default - bitrate`; negative when the plan exceeds the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<i64>,
    /// Per-tier CRF statistics (encode-for-each mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BitrateStatistics>,
    /// Metric sweep curve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cbr_encodings: Vec<SweepPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_step: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knee_found: Option<bool>,
    /// Error message of a failed tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl TierPlan {
    /// An empty plan for a tier, to be filled by the optimizer.
    pub fn new(width: u32, height: u32, bitrate_default: u64) -> Self {
        Self {
            width,
            height,
            bitrate_default,
            bitrate: None,
            target_bitrate: None,
            retained: false,
            savings: None,
            statistics: None,
            cbr_encodings: Vec::new(),
            bitrate_step: None,
            knee_found: None,
            failure: None,
        }
    }

    /// Sets the chosen bitrate and the savings against the default.
    pub fn choose(mut self, bitrate: u64, retained: bool) -> Self {
        self.bitrate = Some(bitrate);
        self.retained = retained;
        self.savings = Some(self.bitrate_default as i64 - bitrate as i64);
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.retained = false;
        self.failure = Some(message.into());
        self
    }

    pub fn resolution_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The per-title ladder a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedLadder {
    pub encoding_profiles: Vec<TierPlan>,
    pub overall_bitrate_default: u64,
    pub overall_bitrate_optimized: u64,
}

/// One timestamped analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub processing_date: DateTime<Utc>,
    pub parameters: AnalysisParameters,
    /// Reference CRF statistics (linear mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<BitrateStatistics>,
    pub optimized_encoding_ladder: OptimizedLadder,
}
