// ============================================================================
// pertitle-core/src/analysis/sampling.rs
// ============================================================================
//
// SAMPLING COORDINATOR: Measurements Against the External Collaborators
//
// This module splits the source timeline into measurement windows and turns
// encode+probe / encode+score round trips into Samples. It owns the lifetime
// of every encoded artifact: each one is deleted as soon as its measurement
// finishes, whether the measurement succeeded or not.
//
// KEY COMPONENTS:
// - segment: equal-length, contiguous windows covering the whole duration
// - SamplingCoordinator: CRF window sampling and CBR point sampling
// - measure_artifact: scoped acquisition and release of one artifact
//
// CONCURRENCY:
// CRF windows have no ordering dependency and may be measured on the rayon
// pool; results are always returned in window order and the first failure
// aborts the batch.

// ---- External crate imports ----
use rayon::prelude::*;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher};
use crate::external::Toolchain;
use crate::media::{MetricKind, Resolution, TimeWindow};
use crate::temp_files::TempArtifact;

/// One measurement: the bitrate of an encode and, for sweeps, its quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub bitrate: u64,
    pub quality: Option<f64>,
}

/// Splits `[0, duration)` into `segments` contiguous windows of equal length.
///
/// The last window ends exactly at `duration`.
pub fn segment(duration: f64, segments: usize) -> CoreResult<Vec<TimeWindow>> {
    if segments == 0 {
        return Err(CoreError::Configuration(
            "Number of segments must be at least 1".to_string(),
        ));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::Configuration(format!(
            "Cannot segment a source of duration {duration}"
        )));
    }

    let part = duration / segments as f64;
    Ok((0..segments)
        .map(|i| {
            let start = i as f64 * part;
            let end = if i + 1 == segments {
                duration
            } else {
                (i + 1) as f64 * part
            };
            TimeWindow::new(start, end)
        })
        .collect())
}

/// Produces an artifact, measures it, and deletes it on every path.
///
/// A failed deletion does not change the measurement outcome; it is reported
/// as an `ArtifactCleanupFailed` event.
pub(crate) fn measure_artifact<T>(
    events: &EventDispatcher,
    produce: impl FnOnce() -> CoreResult<PathBuf>,
    measure: impl FnOnce(&Path) -> CoreResult<T>,
) -> CoreResult<T> {
    let artifact = TempArtifact::adopt(produce()?);
    let result = measure(artifact.path());
    let path = artifact.path().display().to_string();
    if let Err(e) = artifact.remove() {
        events.emit(Event::ArtifactCleanupFailed {
            path,
            message: e.to_string(),
        });
    }
    result
}

/// Drives measurement calls for the optimizers.
pub struct SamplingCoordinator<'a> {
    toolchain: Toolchain<'a>,
    events: &'a EventDispatcher,
    parallel: bool,
}

impl<'a> SamplingCoordinator<'a> {
    pub fn new(toolchain: Toolchain<'a>, events: &'a EventDispatcher, parallel: bool) -> Self {
        Self {
            toolchain,
            events,
            parallel,
        }
    }

    /// One CRF encode plus one probe per window; samples come back in window order.
    pub fn sample_constant_quality(
        &self,
        input: &Path,
        resolution: Resolution,
        quality: u8,
        idr_interval_frames: u32,
        windows: &[TimeWindow],
    ) -> CoreResult<Vec<Sample>> {
        let total = windows.len();
        let measure = |(index, window): (usize, &TimeWindow)| -> CoreResult<Sample> {
            let bitrate = measure_artifact(
                self.events,
                || {
                    self.toolchain.crf_encoder.encode_crf(
                        input,
                        resolution,
                        quality,
                        idr_interval_frames,
                        *window,
                    )
                },
                |artifact| {
                    self.toolchain.prober.probe(artifact)?.bitrate.ok_or_else(|| {
                        CoreError::Probe(format!(
                            "{}: encoded segment reports no bitrate",
                            artifact.display()
                        ))
                    })
                },
            )?;

            self.events.emit(Event::SegmentMeasured {
                resolution: resolution.to_string(),
                index,
                total,
                bitrate,
            });
            Ok(Sample {
                bitrate,
                quality: None,
            })
        };

        if self.parallel {
            windows.par_iter().enumerate().map(measure).collect()
        } else {
            windows.iter().enumerate().map(measure).collect()
        }
    }

    /// One CBR encode of `window` plus one quality score against the source.
    #[allow(clippy::too_many_arguments)]
    pub fn sample_constant_bitrate(
        &self,
        input: &Path,
        resolution: Resolution,
        bitrate: u64,
        idr_interval_frames: u32,
        window: TimeWindow,
        metric: MetricKind,
        reference_resolution: Resolution,
    ) -> CoreResult<Sample> {
        let quality = measure_artifact(
            self.events,
            || {
                self.toolchain.cbr_encoder.encode_cbr(
                    input,
                    resolution,
                    bitrate,
                    idr_interval_frames,
                    window,
                )
            },
            |artifact| {
                self.toolchain
                    .scorer
                    .score(metric, artifact, input, reference_resolution)
            },
        )?;

        self.events.emit(Event::SweepPointMeasured {
            resolution: resolution.to_string(),
            bitrate,
            quality,
        });
        Ok(Sample {
            bitrate,
            quality: Some(quality),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_are_contiguous_and_exhaustive() {
        let windows = segment(100.0, 3).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, 0.0);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(windows[2].end, 100.0);
    }

    #[test]
    fn test_single_window_spans_duration() {
        let windows = segment(42.5, 1).unwrap();
        assert_eq!(windows, vec![TimeWindow::new(0.0, 42.5)]);
    }

    #[test]
    fn test_invalid_segmentation() {
        assert!(segment(10.0, 0).is_err());
        assert!(segment(0.0, 4).is_err());
        assert!(segment(f64::NAN, 4).is_err());
    }

    #[test]
    fn test_measure_artifact_removes_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.mp4");
        let result: CoreResult<u64> = measure_artifact(
            &EventDispatcher::new(),
            || {
                std::fs::write(&path, b"encoded")?;
                Ok(path.clone())
            },
            |_| Err(CoreError::Probe("unreadable".to_string())),
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_measure_artifact_removes_file_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.mp4");
        let size = measure_artifact(
            &EventDispatcher::new(),
            || {
                std::fs::write(&path, b"encoded")?;
                Ok(path.clone())
            },
            |artifact| Ok(std::fs::metadata(artifact)?.len()),
        )
        .unwrap();
        assert_eq!(size, 7);
        assert!(!path.exists());
    }

    #[derive(Default)]
    struct Collect(std::sync::Mutex<Vec<Event>>);

    impl crate::events::EventHandler for Collect {
        fn handle(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_failed_cleanup_is_reported_as_event() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-removable");
        std::fs::create_dir(&blocker).unwrap();

        let collected = std::sync::Arc::new(Collect::default());
        let mut events = EventDispatcher::new();
        events.add_handler(collected.clone());

        let value = measure_artifact(&events, || Ok(blocker.clone()), |_| Ok(42u64)).unwrap();
        assert_eq!(value, 42);

        let seen = collected.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0],
            Event::ArtifactCleanupFailed { path, .. } if path == &blocker.display().to_string()
        ));
    }
}
