// ============================================================================
// pertitle-core/src/analysis/knee_point.rs
// ============================================================================
//
// KNEE POINT ANALYSIS: Diminishing-Returns Detection on a Quality Curve
//
// A metric sweep produces an ascending bitrate -> quality curve for one tier.
// The knee is the last bitrate before the quality gain per bit collapses below
// a caller-supplied threshold: spending more than that buys almost nothing.
//
// The threshold is expressed as the minimum acceptable quality gain per
// bitrate step, so it is divided by the step to obtain a per-bit slope.

/// One measured point of a sweep: bitrate and the quality it achieved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub bitrate: u64,
    pub quality: f64,
}

impl CurvePoint {
    pub fn new(bitrate: u64, quality: f64) -> Self {
        Self { bitrate, quality }
    }
}

/// Outcome of knee detection over one curve.
#[derive(Debug, Clone, PartialEq)]
pub struct KneePoint {
    /// Index of the chosen point in the curve.
    pub index: usize,
    pub bitrate: u64,
    pub quality: f64,
    /// Quality gain per bit between point `j` and `j + 1`, one entry per interval.
    pub slopes: Vec<f64>,
    /// `false` when quality kept improving through the whole sweep and the
    /// last point was taken.
    pub knee_found: bool,
}

/// Finds the knee of an ascending curve.
///
/// Scans `slope_j = (q[j+1] - q[j]) / (b[j+1] - b[j])` in ascending bitrate
/// order and stops at the first `j` with `slope_j <= threshold / step`,
/// choosing point `j`. Without such a `j` the last point is chosen. A
/// single-point curve yields that point. Returns `None` for an empty curve.
pub fn find_knee(curve: &[CurvePoint], threshold: f64, step: u64) -> Option<KneePoint> {
    let last = curve.len().checked_sub(1)?;

    // ========================================================================
    // STEP 1: LOCAL SLOPES
    // ========================================================================

    let slopes: Vec<f64> = curve
        .windows(2)
        .map(|pair| {
            let gain = pair[1].quality - pair[0].quality;
            let spent = pair[1].bitrate.saturating_sub(pair[0].bitrate).max(1) as f64;
            gain / spent
        })
        .collect();

    // ========================================================================
    // STEP 2: FIRST COLLAPSE OF THE SLOPE
    // ========================================================================

    let limit = threshold / step.max(1) as f64;
    let knee = slopes.iter().position(|&slope| slope <= limit);

    // ========================================================================
    // STEP 3: FALLBACK TO THE LAST POINT
    // ========================================================================

    let index = knee.unwrap_or(last);
    Some(KneePoint {
        index,
        bitrate: curve[index].bitrate,
        quality: curve[index].quality,
        slopes,
        knee_found: knee.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(u64, f64)]) -> Vec<CurvePoint> {
        points.iter().map(|&(b, q)| CurvePoint::new(b, q)).collect()
    }

    #[test]
    fn test_knee_before_slope_collapse() {
        let c = curve(&[
            (1_000_000, 0.90),
            (1_100_000, 0.95),
            (1_200_000, 0.951),
            (1_300_000, 0.952),
        ]);
        let knee = find_knee(&c, 0.01, 100_000).unwrap();
        assert_eq!(knee.bitrate, 1_100_000);
        assert_eq!(knee.index, 1);
        assert!(knee.knee_found);
        assert_eq!(knee.slopes.len(), 3);
    }

    #[test]
    fn test_no_knee_takes_last_point() {
        let c = curve(&[(500_000, 0.80), (600_000, 0.85), (700_000, 0.90)]);
        let knee = find_knee(&c, 0.01, 100_000).unwrap();
        assert_eq!(knee.bitrate, 700_000);
        assert_eq!(knee.index, 2);
        assert!(!knee.knee_found);
    }

    #[test]
    fn test_single_point_curve() {
        let c = curve(&[(300_000, 0.97)]);
        let knee = find_knee(&c, 0.01, 100_000).unwrap();
        assert_eq!(knee.bitrate, 300_000);
        assert!(knee.slopes.is_empty());
    }

    #[test]
    fn test_empty_curve() {
        assert_eq!(find_knee(&[], 0.01, 100_000), None);
    }

    #[test]
    fn test_quality_drop_counts_as_collapse() {
        let c = curve(&[(1_000_000, 0.95), (1_100_000, 0.94), (1_200_000, 0.99)]);
        let knee = find_knee(&c, 0.0, 100_000).unwrap();
        assert_eq!(knee.bitrate, 1_000_000);
    }
}
