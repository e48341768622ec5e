// ============================================================================
// pertitle-core/src/analysis/crf.rs
// ============================================================================
//
// CRF STATISTICAL OPTIMIZER: Weighted Segment Bitrates and Ladder Projection
//
// A constant-quality encode reveals how many bits each segment of a title
// needs. This module reduces the per-segment bitrates to one optimal bitrate
// with outlier-aware weighting, then projects that bitrate onto every tier.
//
// WEIGHTING (in units of the sample standard deviation sd around the mean):
//   b >  avg + sd            -> 4
//   b >  avg + sd/2          -> 2
//   b >= avg - sd/2          -> 1
//   b >= avg - sd            -> 0.5
//   otherwise                -> 0
//
// PROJECTION:
//   target = floor(optimal / scale_factor); a non-required tier whose target
//   falls below its minimum is elided, every other tier is clamped into
//   [bitrate_min, bitrate_max] and kept.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ladder::{EncodingLadder, EncodingProfile};

/// Summary of a set of CRF segment bitrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitrateStatistics {
    /// Weighted optimum in bits per second.
    pub optimal: f64,
    pub average: f64,
    pub peak: u64,
    /// Bessel-corrected sample standard deviation; absent for a single sample.
    pub standard_deviation: Option<f64>,
}

/// Weight of one sample given the mean and standard deviation of its set.
pub fn sample_weight(bitrate: f64, average: f64, stdev: f64) -> f64 {
    if bitrate > average + stdev {
        4.0
    } else if bitrate > average + stdev / 2.0 {
        2.0
    } else if bitrate >= average - stdev / 2.0 {
        1.0
    } else if bitrate >= average - stdev {
        0.5
    } else {
        0.0
    }
}

/// Computes average, peak, deviation and the weighted optimum of `samples`.
pub fn compute_statistics(samples: &[u64]) -> CoreResult<BitrateStatistics> {
    let peak = *samples
        .iter()
        .max()
        .ok_or_else(|| CoreError::Configuration("No CRF samples to analyze".to_string()))?;

    let n = samples.len() as f64;
    let average = samples.iter().map(|&b| b as f64).sum::<f64>() / n;

    if samples.len() == 1 {
        return Ok(BitrateStatistics {
            optimal: average,
            average,
            peak,
            standard_deviation: None,
        });
    }

    let variance = samples
        .iter()
        .map(|&b| (b as f64 - average).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let stdev = variance.sqrt();

    let (weighted_sum, weight_total) = samples.iter().fold((0.0, 0.0), |(sum, total), &b| {
        let b = b as f64;
        let w = sample_weight(b, average, stdev);
        (sum + w * b, total + w)
    });

    if weight_total == 0.0 {
        return Err(CoreError::DegenerateStatistics(format!(
            "all {} samples received zero weight (average {:.0}, stdev {:.0})",
            samples.len(),
            average,
            stdev
        )));
    }

    Ok(BitrateStatistics {
        optimal: weighted_sum / weight_total,
        average,
        peak,
        standard_deviation: Some(stdev),
    })
}

/// The bitrate a tier receives from a CRF optimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProjection {
    /// `floor(optimal / scale_factor)` before clamping.
    pub target: u64,
    /// Target clamped into the tier bounds.
    pub bitrate: u64,
    pub retained: bool,
}

/// Applies the elision and clamp rule to a target bitrate.
pub fn constrain(profile: &EncodingProfile, target: u64) -> TierProjection {
    TierProjection {
        target,
        bitrate: profile.clamp(target),
        retained: profile.required() || target >= profile.bitrate_min(),
    }
}

/// Scales the reference optimum down to `profile` and constrains it.
pub fn project_profile(profile: &EncodingProfile, optimal: f64) -> TierProjection {
    let factor = profile.scale_factor().unwrap_or(1.0);
    constrain(profile, (optimal / factor).floor() as u64)
}

/// Projects the reference optimum onto every tier, in ladder order.
pub fn project(ladder: &EncodingLadder, optimal: f64) -> Vec<TierProjection> {
    ladder
        .profiles()
        .iter()
        .map(|profile| project_profile(profile, optimal))
        .collect()
}

/// Sum of the bitrates of retained tiers.
pub fn overall_optimized(projections: &[TierProjection]) -> u64 {
    projections
        .iter()
        .filter(|p| p.retained)
        .map(|p| p.bitrate)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(default: u64, min: u64, max: u64, required: bool) -> EncodingProfile {
        EncodingProfile::new(640, 360, default, min, max, required, None).unwrap()
    }

    #[test]
    fn test_single_sample_is_optimal() {
        let stats = compute_statistics(&[2_345_678]).unwrap();
        assert_eq!(stats.optimal, 2_345_678.0);
        assert_eq!(stats.average, 2_345_678.0);
        assert_eq!(stats.peak, 2_345_678);
        assert_eq!(stats.standard_deviation, None);
    }

    #[test]
    fn test_identical_samples() {
        let stats = compute_statistics(&[3_000_000; 5]).unwrap();
        assert_eq!(stats.optimal, 3_000_000.0);
        assert_eq!(stats.standard_deviation, Some(0.0));
    }

    #[test]
    fn test_spike_pulls_optimum_up() {
        let samples = [1_000_000, 1_000_000, 1_000_000, 1_000_000, 3_000_000];
        let stats = compute_statistics(&samples).unwrap();
        assert_eq!(stats.peak, 3_000_000);
        assert_eq!(stats.average, 1_400_000.0);
        assert!(stats.optimal > stats.average);
        // four samples in the middle band (weight 1) and one spike (weight 4)
        assert_eq!(stats.optimal, (4.0 * 1_000_000.0 + 4.0 * 3_000_000.0) / 8.0);
    }

    #[test]
    fn test_weight_bands() {
        let (avg, sd) = (1_000.0, 100.0);
        assert_eq!(sample_weight(1_101.0, avg, sd), 4.0);
        assert_eq!(sample_weight(1_100.0, avg, sd), 2.0);
        assert_eq!(sample_weight(1_050.0, avg, sd), 1.0);
        assert_eq!(sample_weight(950.0, avg, sd), 1.0);
        assert_eq!(sample_weight(949.0, avg, sd), 0.5);
        assert_eq!(sample_weight(900.0, avg, sd), 0.5);
        assert_eq!(sample_weight(899.0, avg, sd), 0.0);
    }

    #[test]
    fn test_empty_samples_rejected() {
        assert!(compute_statistics(&[]).is_err());
    }

    #[test]
    fn test_clamp_required_profile() {
        let p = profile(400_000, 300_000, 500_000, true);
        let low = constrain(&p, 250_000);
        assert_eq!(low.bitrate, 300_000);
        assert!(low.retained);
        let high = constrain(&p, 650_000);
        assert_eq!(high.bitrate, 500_000);
        assert!(high.retained);
    }

    #[test]
    fn test_elide_optional_profile() {
        let p = profile(750_000, 200_000, 2_000_000, false);
        let projection = constrain(&p, 150_000);
        assert!(!projection.retained);
        assert_eq!(projection.target, 150_000);
        assert_eq!(overall_optimized(&[projection]), 0);
    }

    #[test]
    fn test_projection_uses_scale_factor() {
        let ladder = EncodingLadder::new(vec![
            profile(4_000_000, 1_000_000, 6_000_000, true),
            profile(1_000_000, 300_000, 3_000_000, true),
            profile(500_000, 200_000, 1_000_000, false),
        ])
        .unwrap();

        let projections = project(&ladder, 2_000_001.0);
        assert_eq!(projections[0].bitrate, 2_000_001);
        assert_eq!(projections[1].target, 500_000);
        assert_eq!(projections[1].bitrate, 500_000);
        assert_eq!(projections[2].target, 250_000);
        assert!(projections[2].retained);
        assert_eq!(overall_optimized(&projections), 2_750_001);
    }
}
