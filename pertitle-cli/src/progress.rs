// ============================================================================
// pertitle-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Rendering Core Events in the Terminal
//
// pertitle-core reports its progress through events. This module turns them
// into an indicatif progress bar counting encode+measure steps, plus log
// lines for the probe result and every tier outcome.
//
// KEY COMPONENTS:
// - ProgressEventHandler: EventHandler backed by an indicatif ProgressBar
//
// AI-ASSISTANT-INFO: CLI-specific progress reporting

// ---- External crate imports ----
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};
use pertitle_core::events::{Event, EventHandler};
use pertitle_core::utils::{format_bitrate, format_bitrate_delta, format_duration};

// ---- Standard library imports ----
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Drives a progress bar from analysis events.
pub struct ProgressEventHandler {
    bar: ProgressBar,
}

impl ProgressEventHandler {
    /// A handler drawing to stderr.
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler whose bar is never drawn; log lines are still emitted.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for ProgressEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ProgressEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::AnalysisStarted { method, input_file, tiers, measurements } => {
                info!("{method} analysis of {input_file} ({tiers} tiers, {measurements} measurements)");
                self.bar.set_length(*measurements as u64);
                self.bar.set_position(0);
                self.bar.set_message(method.clone());
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
            Event::ProbeCompleted { duration, framerate, resolution } => {
                self.bar.suspend(|| {
                    info!("Source: {resolution} @ {framerate} fps, {}", format_duration(*duration));
                });
            }
            Event::SegmentMeasured { resolution, index, total, bitrate } => {
                debug!("{resolution} segment {}/{total}: {}", index + 1, format_bitrate(*bitrate));
                self.bar.inc(1);
            }
            Event::SweepPointMeasured { resolution, bitrate, quality } => {
                debug!("{resolution} @ {}: {quality:.5}", format_bitrate(*bitrate));
                self.bar.inc(1);
            }
            Event::TierCompleted { resolution, bitrate, retained, savings } => {
                self.bar.suspend(|| {
                    let state = if *retained { "" } else { " (elided)" };
                    info!(
                        "{resolution}: {}{state}, saves {}",
                        format_bitrate(*bitrate),
                        format_bitrate_delta(*savings)
                    );
                });
            }
            Event::TierFailed { resolution, message } => {
                self.bar.suspend(|| warn!("{resolution}: tier failed: {message}"));
            }
            Event::ArtifactCleanupFailed { path, message } => {
                self.bar.suspend(|| warn!("Could not remove temporary artifact {path}: {message}"));
            }
            Event::AnalysisCompleted { method, total_time, .. } => {
                self.bar.finish_and_clear();
                info!("{method} analysis finished in {}", format_duration(total_time.as_secs_f64()));
            }
        }
    }
}
