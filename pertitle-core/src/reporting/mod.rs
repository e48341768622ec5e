// ============================================================================
// pertitle-core/src/reporting/mod.rs
// ============================================================================
//
// RESULT ASSEMBLY: Turning Optimizer Output into Persistable Records
//
// This module defines the analysis result model and the session document
// that accumulates results across runs. Assembly is pure: it takes the
// per-tier plans produced by an optimizer and derives the ladder totals.
//
// KEY COMPONENTS:
// - AnalysisResult / TierPlan: one timestamped record of a run
// - AnalysisSession: the per-title document holding every record
// - assemble: computes overall default and optimized bitrates
//
// TOTALS:
//   overall_bitrate_default   = sum of bitrate_default over all tiers
//   overall_bitrate_optimized = sum of bitrate over retained tiers

mod result;
mod session;

pub use result::{
    AnalysisParameters, AnalysisResult, CrfMode, CrfParameters, MetricParameters, OptimizedLadder,
    TierPlan,
};
pub use session::AnalysisSession;

use chrono::Utc;

use crate::analysis::crf::BitrateStatistics;

/// Builds the optimized ladder section from per-tier plans, in ladder order.
pub fn assemble_ladder(plans: Vec<TierPlan>) -> OptimizedLadder {
    let overall_bitrate_default = plans.iter().map(|p| p.bitrate_default).sum();
    let overall_bitrate_optimized = plans
        .iter()
        .filter(|p| p.retained)
        .filter_map(|p| p.bitrate)
        .sum();

    OptimizedLadder {
        encoding_profiles: plans,
        overall_bitrate_default,
        overall_bitrate_optimized,
    }
}

/// Creates a result stamped with the current UTC time.
pub fn assemble(
    parameters: AnalysisParameters,
    bitrate: Option<BitrateStatistics>,
    plans: Vec<TierPlan>,
) -> AnalysisResult {
    AnalysisResult {
        processing_date: Utc::now(),
        parameters,
        bitrate,
        optimized_encoding_ladder: assemble_ladder(plans),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metric::SweepPoint;
    use crate::ladder::{EncodingLadder, EncodingProfile};
    use crate::media::MetricKind;

    fn crf_parameters() -> AnalysisParameters {
        AnalysisParameters::Crf(CrfParameters {
            width: Some(1920),
            height: Some(1080),
            crf_value: 23,
            idr_interval: 2,
            number_of_parts: 10,
            part_duration: 12.5,
            model: CrfMode::Linear,
        })
    }

    #[test]
    fn test_totals_skip_elided_tiers() {
        let plans = vec![
            TierPlan::new(1920, 1080, 4_500_000).choose(3_000_000, true),
            TierPlan::new(1280, 720, 3_400_000).choose(2_000_000, true),
            TierPlan::new(480, 270, 750_000).choose(200_000, false),
        ];
        let ladder = assemble_ladder(plans);

        assert_eq!(ladder.overall_bitrate_default, 8_650_000);
        assert_eq!(ladder.overall_bitrate_optimized, 5_000_000);
        assert_eq!(ladder.encoding_profiles[2].savings, Some(550_000));
    }

    #[test]
    fn test_failed_tier_contributes_nothing() {
        let plans = vec![
            TierPlan::new(1920, 1080, 4_500_000).choose(4_000_000, true),
            TierPlan::new(1280, 720, 3_400_000).fail("Timeout"),
        ];
        let ladder = assemble_ladder(plans);

        assert_eq!(ladder.overall_bitrate_optimized, 4_000_000);
        assert_eq!(ladder.encoding_profiles[1].bitrate, None);
        assert_eq!(ladder.encoding_profiles[1].failure.as_deref(), Some("Timeout"));
    }

    #[test]
    fn test_negative_savings() {
        let plan = TierPlan::new(640, 360, 1_000_000).choose(1_200_000, true);
        assert_eq!(plan.savings, Some(-200_000));
    }

    #[test]
    fn test_parameters_are_tagged_by_method() {
        let json = serde_json::to_value(crf_parameters()).unwrap();
        assert_eq!(json["method"], "CRF");
        assert_eq!(json["model"], "linear");

        let metric = AnalysisParameters::Metric(MetricParameters {
            metric: MetricKind::Psnr,
            threshold: 0.1,
            bitrate_steps: 100_000,
            individual_steps: false,
            idr_interval: 2,
            number_of_parts: 1,
            part_duration: 60.0,
        });
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["method"], "Metric");
        assert_eq!(json["metric"], "psnr");
    }

    #[test]
    fn test_session_json_round_trip() {
        let ladder = EncodingLadder::new(vec![
            EncodingProfile::new(1920, 1080, 4_500_000, 1_000_000, 6_000_000, true, None).unwrap(),
            EncodingProfile::new(640, 360, 1_000_000, 300_000, 1_500_000, false, Some(50_000))
                .unwrap(),
        ])
        .unwrap();

        let mut session = AnalysisSession::new("/media/title.mp4", &ladder);
        session.append(assemble(
            crf_parameters(),
            Some(BitrateStatistics {
                optimal: 2_500_000.5,
                average: 2_400_000.25,
                peak: 3_100_000,
                standard_deviation: Some(123_456.75),
            }),
            vec![
                TierPlan::new(1920, 1080, 4_500_000).choose(2_500_000, true),
                TierPlan::new(640, 360, 1_000_000).choose(300_000, false),
            ],
        ));

        let mut sweep_plan = TierPlan::new(640, 360, 1_000_000).choose(600_000, true);
        sweep_plan.bitrate_step = Some(50_000);
        sweep_plan.knee_found = Some(true);
        sweep_plan.cbr_encodings = vec![
            SweepPoint {
                bitrate: 550_000,
                metric_value: 0.95,
                quality_step_ratio: Some(0.0000004),
            },
            SweepPoint {
                bitrate: 600_000,
                metric_value: 0.97,
                quality_step_ratio: None,
            },
        ];
        session.append(assemble(
            AnalysisParameters::Metric(MetricParameters {
                metric: MetricKind::Ssim,
                threshold: 0.005,
                bitrate_steps: 100_000,
                individual_steps: true,
                idr_interval: 2,
                number_of_parts: 1,
                part_duration: 125.0,
            }),
            None,
            vec![
                TierPlan::new(1920, 1080, 4_500_000).fail("encode failed"),
                sweep_plan,
            ],
        ));

        let restored = AnalysisSession::from_json(&session.to_json().unwrap()).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.analyses.len(), 2);
    }

    #[test]
    fn test_session_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("title.json");
        let ladder = EncodingLadder::new(vec![
            EncodingProfile::new(1280, 720, 3_000_000, 1_000_000, 4_000_000, true, None).unwrap(),
        ])
        .unwrap();
        let session = AnalysisSession::new("title.mp4", &ladder);

        session.save(&path).unwrap();
        let loaded = AnalysisSession::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert!(loaded.latest().is_none());
    }
}
