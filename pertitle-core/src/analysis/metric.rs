// ============================================================================
// pertitle-core/src/analysis/metric.rs
// ============================================================================
//
// METRIC SWEEP OPTIMIZER: Per-Tier Bitrate Sweeps with Knee Detection
//
// Each tier is swept independently from its minimum to its maximum bitrate.
// Every candidate is CBR-encoded over the full source and scored against the
// source; the knee of the resulting curve is the tier's optimal bitrate.
//
// A failed measurement aborts only the tier it belongs to. Points within a
// tier are always measured and consumed in ascending bitrate order.

use serde::{Deserialize, Serialize};

use super::knee_point::{CurvePoint, find_knee};
use super::sampling::SamplingCoordinator;
use crate::error::{CoreError, CoreResult};
use crate::ladder::EncodingProfile;
use crate::media::{MetricKind, ProbeInfo, TimeWindow};

/// How the sweep step of each tier is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Global step in bits per second.
    pub default_step: u64,
    /// Use a tier's own `bitrate_step` when it defines one.
    pub individual: bool,
}

impl StepConfig {
    /// The step used for `profile`.
    pub fn step_for(&self, profile: &EncodingProfile) -> u64 {
        match profile.bitrate_step() {
            Some(step) if self.individual => step,
            _ => self.default_step,
        }
    }
}

/// Candidate bitrates `min, min + step, ...` up to `max`; `max` is always the
/// final candidate even when the stepping does not land on it.
pub fn candidate_bitrates(min: u64, max: u64, step: u64) -> CoreResult<Vec<u64>> {
    if step == 0 {
        return Err(CoreError::Configuration("Bitrate step must be positive".to_string()));
    }
    if min > max {
        return Err(CoreError::Configuration(format!(
            "Bitrate range is empty: min {min} > max {max}"
        )));
    }

    let mut candidates: Vec<u64> = (min..=max).step_by(step as usize).collect();
    if candidates.last() != Some(&max) {
        candidates.push(max);
    }
    Ok(candidates)
}

/// One point of a tier sweep as recorded in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub bitrate: u64,
    pub metric_value: f64,
    /// Quality gain per bit towards the next point; absent for the last point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_step_ratio: Option<f64>,
}

/// Successful sweep of one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierSweep {
    pub step: u64,
    pub curve: Vec<SweepPoint>,
    pub optimal_bitrate: u64,
    pub knee_found: bool,
}

/// Inputs shared by every tier of one sweep.
pub(crate) struct SweepContext<'a> {
    pub coordinator: &'a SamplingCoordinator<'a>,
    pub input: &'a std::path::Path,
    pub source: &'a ProbeInfo,
    pub metric: MetricKind,
    pub threshold: f64,
    pub steps: StepConfig,
    pub idr_interval_frames: u32,
}

/// Sweeps one tier and picks its knee.
pub(crate) fn sweep_tier(ctx: &SweepContext<'_>, profile: &EncodingProfile) -> CoreResult<TierSweep> {
    let step = ctx.steps.step_for(profile);
    let candidates = candidate_bitrates(profile.bitrate_min(), profile.bitrate_max(), step)?;
    let window = TimeWindow::new(0.0, ctx.source.duration);

    let mut curve = Vec::with_capacity(candidates.len());
    for bitrate in candidates {
        let sample = ctx.coordinator.sample_constant_bitrate(
            ctx.input,
            profile.resolution(),
            bitrate,
            ctx.idr_interval_frames,
            window,
            ctx.metric,
            ctx.source.resolution(),
        )?;
        let quality = sample.quality.ok_or_else(|| {
            CoreError::Score(format!("No quality measured at {bitrate} bps"))
        })?;
        curve.push(CurvePoint::new(sample.bitrate, quality));
    }

    let knee = find_knee(&curve, ctx.threshold, step)
        .ok_or_else(|| CoreError::Analysis(format!("Empty sweep for {}", profile.resolution())))?;

    let points = curve
        .iter()
        .enumerate()
        .map(|(j, point)| SweepPoint {
            bitrate: point.bitrate,
            metric_value: point.quality,
            quality_step_ratio: knee.slopes.get(j).copied(),
        })
        .collect();

    Ok(TierSweep {
        step,
        curve: points,
        optimal_bitrate: knee.bitrate,
        knee_found: knee.knee_found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_land_on_max() {
        assert_eq!(
            candidate_bitrates(200_000, 500_000, 100_000).unwrap(),
            vec![200_000, 300_000, 400_000, 500_000]
        );
    }

    #[test]
    fn test_candidates_append_max() {
        assert_eq!(
            candidate_bitrates(300_000, 1_000_000, 300_000).unwrap(),
            vec![300_000, 600_000, 900_000, 1_000_000]
        );
    }

    #[test]
    fn test_single_candidate() {
        assert_eq!(candidate_bitrates(400_000, 400_000, 100_000).unwrap(), vec![400_000]);
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(candidate_bitrates(100, 200, 0).is_err());
    }

    #[test]
    fn test_step_selection() {
        let profile = EncodingProfile::new(640, 360, 1_000_000, 300_000, 3_000_000, true, Some(50_000)).unwrap();
        let plain = EncodingProfile::new(480, 270, 750_000, 200_000, 2_000_000, false, None).unwrap();

        let individual = StepConfig { default_step: 100_000, individual: true };
        assert_eq!(individual.step_for(&profile), 50_000);
        assert_eq!(individual.step_for(&plain), 100_000);

        let global = StepConfig { default_step: 100_000, individual: false };
        assert_eq!(global.step_for(&profile), 100_000);
    }
}
