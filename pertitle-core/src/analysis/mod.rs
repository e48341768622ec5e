// ============================================================================
// pertitle-core/src/analysis/mod.rs
// ============================================================================
//
// PER-TITLE ANALYSIS: Entry Points of the Decision Engine
//
// This module ties the ladder, the collaborators and the two optimizers
// together. A PerTitleAnalyzer owns the input path, the template ladder and
// the session history; each run appends exactly one AnalysisResult.
//
// KEY COMPONENTS:
// - PerTitleAnalyzer: run_crf_analysis / run_metric_sweep
// - CrfAnalysisParams / MetricSweepParams: per-run parameters
// - crf, metric, knee_point, sampling: the optimizers and their measurements
//
// FAILURE MODEL:
// - CRF: the first failed window aborts the run, nothing is appended
// - Metric: a failed tier is recorded as failed, the other tiers continue;
//   when every tier fails the run fails and nothing is appended
//
// AI-ASSISTANT-INFO: Analysis orchestration, start here to follow a run

pub mod crf;
pub mod knee_point;
pub mod metric;
pub mod sampling;

// ---- External crate imports ----
use rayon::prelude::*;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

// ---- Internal crate imports ----
use crate::config::{
    CoreConfig, DEFAULT_CRF, DEFAULT_IDR_INTERVAL_SECS, DEFAULT_METRIC, DEFAULT_METRIC_THRESHOLD,
    DEFAULT_SEGMENTS,
};
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher, EventHandler};
use crate::external::Toolchain;
use crate::ladder::{EncodingLadder, EncodingProfile};
use crate::media::{MetricKind, ProbeInfo, Resolution};
use crate::reporting::{
    self, AnalysisParameters, AnalysisResult, AnalysisSession, CrfMode, CrfParameters,
    MetricParameters, TierPlan,
};

use self::crf::{BitrateStatistics, compute_statistics, constrain, project};
use self::metric::{StepConfig, SweepContext, TierSweep, candidate_bitrates, sweep_tier};
use self::sampling::{SamplingCoordinator, segment};

/// Highest constant rate factor accepted by x264.
const MAX_CRF: u8 = 51;

// ============================================================================
// RUN PARAMETERS
// ============================================================================

/// Parameters of a CRF statistical analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct CrfAnalysisParams {
    /// Number of equal-length windows measured per resolution.
    pub segments: usize,
    pub crf: u8,
    /// IDR interval in seconds.
    pub idr_interval_secs: u32,
    /// Resolution sampled in linear mode; defaults to the top tier.
    pub reference: Option<Resolution>,
    pub mode: CrfMode,
}

impl Default for CrfAnalysisParams {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            crf: DEFAULT_CRF,
            idr_interval_secs: DEFAULT_IDR_INTERVAL_SECS,
            reference: None,
            mode: CrfMode::Linear,
        }
    }
}

/// Parameters of a metric sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSweepParams {
    pub metric: MetricKind,
    /// Minimum quality gain per step below which the curve has flattened.
    pub threshold: f64,
    pub steps: StepConfig,
    pub idr_interval_secs: u32,
}

impl MetricSweepParams {
    /// Default sweep parameters using the global step of `config`.
    pub fn for_config(config: &CoreConfig) -> Self {
        Self {
            metric: DEFAULT_METRIC,
            threshold: DEFAULT_METRIC_THRESHOLD,
            steps: StepConfig {
                default_step: config.default_bitrate_step,
                individual: false,
            },
            idr_interval_secs: DEFAULT_IDR_INTERVAL_SECS,
        }
    }
}

impl Default for MetricSweepParams {
    fn default() -> Self {
        Self::for_config(&CoreConfig::default())
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Runs per-title analyses of one input against one template ladder.
///
/// # Examples
///
/// ```rust,no_run
/// use pertitle_core::analysis::{CrfAnalysisParams, PerTitleAnalyzer};
/// use pertitle_core::config::{CoreConfig, default_template_ladder};
/// use pertitle_core::external::{FfmpegEncoder, FfmpegQualityScorer, FfprobeProber, Toolchain};
/// use std::path::Path;
///
/// # fn main() -> pertitle_core::CoreResult<()> {
/// let config = CoreConfig::default();
/// let work_dir = pertitle_core::temp_files::create_temp_dir(&config, "pertitle")?;
/// let prober = FfprobeProber::new();
/// let encoder = FfmpegEncoder::new(work_dir.path(), &config);
/// let scorer = FfmpegQualityScorer::new(&config);
/// let toolchain = Toolchain::new(&prober, &encoder, &encoder, &scorer);
///
/// let mut analyzer = PerTitleAnalyzer::new(
///     Path::new("title.mp4"),
///     default_template_ladder().build()?,
///     toolchain,
///     config,
/// )?;
/// let result = analyzer.run_crf_analysis(&CrfAnalysisParams::default())?;
/// println!("{}", result.optimized_encoding_ladder.overall_bitrate_optimized);
/// # Ok(())
/// # }
/// ```
pub struct PerTitleAnalyzer<'a> {
    input: PathBuf,
    ladder: EncodingLadder,
    toolchain: Toolchain<'a>,
    config: CoreConfig,
    events: EventDispatcher,
    session: AnalysisSession,
}

impl<'a> PerTitleAnalyzer<'a> {
    /// Creates an analyzer with an empty session.
    ///
    /// Fails when the configuration is invalid or `input` is not an existing file.
    pub fn new(
        input: &Path,
        ladder: EncodingLadder,
        toolchain: Toolchain<'a>,
        config: CoreConfig,
    ) -> CoreResult<Self> {
        config.validate()?;
        if !input.is_file() {
            return Err(CoreError::Configuration(format!(
                "Invalid input path: {}",
                input.display()
            )));
        }

        let session = AnalysisSession::new(input, &ladder);
        Ok(Self {
            input: input.to_path_buf(),
            ladder,
            toolchain,
            config,
            events: EventDispatcher::new(),
            session,
        })
    }

    /// Continues an existing session history instead of starting a new one.
    ///
    /// The session must have been recorded with the same template ladder as
    /// the one being analyzed, otherwise `Configuration` is returned.
    pub fn with_session(mut self, session: AnalysisSession) -> CoreResult<Self> {
        if session.template_encoding_ladder != self.ladder.snapshot() {
            return Err(CoreError::Configuration(format!(
                "Session for '{}' was recorded with a different encoding ladder",
                session.input_file_path.display()
            )));
        }
        self.session = session;
        Ok(self)
    }

    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn ladder(&self) -> &EncodingLadder {
        &self.ladder
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn into_session(self) -> AnalysisSession {
        self.session
    }

    /// Samples the title at constant quality and derives every tier's bitrate
    /// from the weighted segment bitrates.
    pub fn run_crf_analysis(&mut self, params: &CrfAnalysisParams) -> CoreResult<&AnalysisResult> {
        validate_idr_interval(params.idr_interval_secs)?;
        if params.crf > MAX_CRF {
            return Err(CoreError::Configuration(format!(
                "CRF value {} is out of range 0-{MAX_CRF}",
                params.crf
            )));
        }
        if params.segments == 0 {
            return Err(CoreError::Configuration(
                "Number of segments must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        let tiers = self.ladder.profiles().len();
        let measurements = match params.mode {
            CrfMode::Linear => params.segments,
            CrfMode::PerProfile => params.segments * tiers,
        };
        self.events.emit(Event::AnalysisStarted {
            method: "CRF".to_string(),
            input_file: self.input.display().to_string(),
            tiers,
            measurements,
        });

        // STEP 1: Probe the source and split its timeline
        let source = self.probe_source()?;
        let windows = segment(source.duration, params.segments)?;
        let idr_interval_frames = source.idr_interval_frames(params.idr_interval_secs);
        let coordinator = SamplingCoordinator::new(self.toolchain, &self.events, self.config.parallel);

        let sample_at = |resolution: Resolution| -> CoreResult<BitrateStatistics> {
            let samples = coordinator.sample_constant_quality(
                &self.input,
                resolution,
                params.crf,
                idr_interval_frames,
                &windows,
            )?;
            let bitrates: Vec<u64> = samples.iter().map(|s| s.bitrate).collect();
            compute_statistics(&bitrates)
        };

        // STEP 2: Measure and plan every tier
        let (reference, statistics, plans) = match params.mode {
            CrfMode::Linear => {
                let reference = match params.reference {
                    Some(reference) => reference,
                    None => top_tier(&self.ladder).ok_or_else(|| {
                        CoreError::Configuration("Encoding ladder has no profiles".to_string())
                    })?,
                };
                let statistics = sample_at(reference)?;
                let plans = self
                    .ladder
                    .profiles()
                    .iter()
                    .zip(project(&self.ladder, statistics.optimal))
                    .map(|(profile, projection)| {
                        let mut plan = plan_for(profile).choose(projection.bitrate, projection.retained);
                        plan.target_bitrate = Some(projection.target);
                        plan
                    })
                    .collect::<Vec<_>>();
                (Some(reference), Some(statistics), plans)
            }
            CrfMode::PerProfile => {
                let mut plans = Vec::with_capacity(tiers);
                for profile in self.ladder.profiles() {
                    let statistics = sample_at(profile.resolution())?;
                    let projection = constrain(profile, statistics.optimal.floor() as u64);
                    let mut plan = plan_for(profile).choose(projection.bitrate, projection.retained);
                    plan.target_bitrate = Some(projection.target);
                    plan.statistics = Some(statistics);
                    plans.push(plan);
                }
                (None, None, plans)
            }
        };

        // STEP 3: Assemble and record
        let parameters = AnalysisParameters::Crf(CrfParameters {
            width: reference.map(|r| r.width),
            height: reference.map(|r| r.height),
            crf_value: params.crf,
            idr_interval: params.idr_interval_secs,
            number_of_parts: params.segments,
            part_duration: source.duration / params.segments as f64,
            model: params.mode,
        });
        Ok(self.finish(parameters, statistics, plans, started))
    }

    /// Sweeps every tier over its bitrate range and picks the knee of each
    /// bitrate/quality curve.
    pub fn run_metric_sweep(&mut self, params: &MetricSweepParams) -> CoreResult<&AnalysisResult> {
        validate_idr_interval(params.idr_interval_secs)?;
        if !params.threshold.is_finite() || params.threshold < 0.0 {
            return Err(CoreError::Configuration(format!(
                "Metric threshold must be a non-negative number, got {}",
                params.threshold
            )));
        }
        if params.steps.default_step == 0 {
            return Err(CoreError::Configuration(
                "Bitrate step must be positive".to_string(),
            ));
        }

        let started = Instant::now();
        let mut measurements = 0;
        for profile in self.ladder.profiles() {
            measurements += candidate_bitrates(
                profile.bitrate_min(),
                profile.bitrate_max(),
                params.steps.step_for(profile),
            )?
            .len();
        }
        self.events.emit(Event::AnalysisStarted {
            method: "Metric".to_string(),
            input_file: self.input.display().to_string(),
            tiers: self.ladder.profiles().len(),
            measurements,
        });

        // STEP 1: Probe the source
        let source = self.probe_source()?;
        let coordinator = SamplingCoordinator::new(self.toolchain, &self.events, self.config.parallel);
        let ctx = SweepContext {
            coordinator: &coordinator,
            input: &self.input,
            source: &source,
            metric: params.metric,
            threshold: params.threshold,
            steps: params.steps,
            idr_interval_frames: source.idr_interval_frames(params.idr_interval_secs),
        };

        // STEP 2: Sweep every tier; outcomes stay in ladder order
        let profiles = self.ladder.profiles();
        let outcomes: Vec<CoreResult<TierSweep>> = if self.config.parallel {
            profiles.par_iter().map(|p| sweep_tier(&ctx, p)).collect()
        } else {
            profiles.iter().map(|p| sweep_tier(&ctx, p)).collect()
        };

        // STEP 3: Record successes and failures per tier
        let mut plans = Vec::with_capacity(profiles.len());
        let mut first_failure = None;
        for (profile, outcome) in profiles.iter().zip(outcomes) {
            let mut plan = plan_for(profile);
            plan.bitrate_step = Some(params.steps.step_for(profile));
            match outcome {
                Ok(sweep) => {
                    plan = plan.choose(sweep.optimal_bitrate, true);
                    plan.cbr_encodings = sweep.curve;
                    plan.knee_found = Some(sweep.knee_found);
                }
                Err(err) => {
                    let message = err.to_string();
                    self.events.emit(Event::TierFailed {
                        resolution: profile.resolution().to_string(),
                        message: message.clone(),
                    });
                    first_failure.get_or_insert_with(|| message.clone());
                    plan = plan.fail(message);
                }
            }
            plans.push(plan);
        }

        if plans.iter().all(|p| p.failure.is_some()) {
            return Err(CoreError::Analysis(format!(
                "All {} tiers failed; first error: {}",
                plans.len(),
                first_failure.unwrap_or_default()
            )));
        }

        let parameters = AnalysisParameters::Metric(MetricParameters {
            metric: params.metric,
            threshold: params.threshold,
            bitrate_steps: params.steps.default_step,
            individual_steps: params.steps.individual,
            idr_interval: params.idr_interval_secs,
            number_of_parts: 1,
            part_duration: source.duration,
        });
        Ok(self.finish(parameters, None, plans, started))
    }

    fn probe_source(&self) -> CoreResult<ProbeInfo> {
        let source = self.toolchain.prober.probe(&self.input)?;
        self.events.emit(Event::ProbeCompleted {
            duration: source.duration,
            framerate: source.framerate,
            resolution: source.resolution().to_string(),
        });
        Ok(source)
    }

    /// Emits the per-tier and completion events, then appends the result.
    fn finish(
        &mut self,
        parameters: AnalysisParameters,
        statistics: Option<BitrateStatistics>,
        plans: Vec<TierPlan>,
        started: Instant,
    ) -> &AnalysisResult {
        for plan in plans.iter().filter(|p| p.failure.is_none()) {
            self.events.emit(Event::TierCompleted {
                resolution: plan.resolution_label(),
                bitrate: plan.bitrate.unwrap_or_default(),
                retained: plan.retained,
                savings: plan.savings.unwrap_or_default(),
            });
        }

        let result = reporting::assemble(parameters, statistics, plans);
        self.events.emit(Event::AnalysisCompleted {
            method: result.parameters.method().to_string(),
            overall_bitrate_default: result.optimized_encoding_ladder.overall_bitrate_default,
            overall_bitrate_optimized: result.optimized_encoding_ladder.overall_bitrate_optimized,
            total_time: started.elapsed(),
        });
        self.session.append(result)
    }
}

fn validate_idr_interval(idr_interval_secs: u32) -> CoreResult<()> {
    if idr_interval_secs == 0 {
        return Err(CoreError::Configuration(
            "IDR interval must be at least 1 second".to_string(),
        ));
    }
    Ok(())
}

/// Resolution of the tier with the highest default bitrate.
fn top_tier(ladder: &EncodingLadder) -> Option<Resolution> {
    ladder
        .profiles()
        .iter()
        .find(|p| p.bitrate_default() == ladder.max_bitrate_default())
        .map(EncodingProfile::resolution)
}

fn plan_for(profile: &EncodingProfile) -> TierPlan {
    TierPlan::new(profile.width(), profile.height(), profile.bitrate_default())
}
