// pertitle-core/tests/common/mod.rs
//
// Fake collaborators shared by the analysis integration tests. The fake
// encoders write real files ("WxH bitrate") into a temp work dir so artifact
// cleanup can be observed; the fake prober and scorer read them back.

#![allow(dead_code)]

use pertitle_core::error::{CoreError, CoreResult};
use pertitle_core::events::{Event, EventHandler};
use pertitle_core::external::{
    ConstantBitrateEncoder, ConstantQualityEncoder, Prober, QualityScorer, Toolchain,
};
use pertitle_core::ladder::{EncodingLadder, EncodingProfile};
use pertitle_core::media::{MetricKind, ProbeInfo, Resolution, TimeWindow};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type CrfBitrateFn = dyn Fn(Resolution, TimeWindow) -> CoreResult<u64> + Send + Sync;
type QualityFn = dyn Fn(Resolution, u64) -> CoreResult<f64> + Send + Sync;

pub struct FakeTools {
    pub source: ProbeInfo,
    crf_bitrate: Box<CrfBitrateFn>,
    quality: Box<QualityFn>,
    work_dir: TempDir,
    created: Mutex<Vec<PathBuf>>,
    counter: AtomicUsize,
}

impl FakeTools {
    pub fn new(source: ProbeInfo) -> Self {
        Self {
            source,
            crf_bitrate: Box::new(|_, _| Ok(1_000_000)),
            quality: Box::new(|_, bitrate| Ok(bitrate as f64 / 1e7)),
            work_dir: tempfile::tempdir().expect("Failed to create work dir"),
            created: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn with_crf_bitrates(
        mut self,
        f: impl Fn(Resolution, TimeWindow) -> CoreResult<u64> + Send + Sync + 'static,
    ) -> Self {
        self.crf_bitrate = Box::new(f);
        self
    }

    pub fn with_quality(
        mut self,
        f: impl Fn(Resolution, u64) -> CoreResult<f64> + Send + Sync + 'static,
    ) -> Self {
        self.quality = Box::new(f);
        self
    }

    pub fn toolchain(&self) -> Toolchain<'_> {
        Toolchain::new(self, self, self, self)
    }

    /// Number of artifacts the fake encoders produced.
    pub fn artifacts_created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Produced artifacts that still exist on disk.
    pub fn leftover_artifacts(&self) -> Vec<PathBuf> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.exists())
            .cloned()
            .collect()
    }

    fn write_artifact(&self, prefix: &str, resolution: Resolution, bitrate: u64) -> CoreResult<PathBuf> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = self.work_dir.path().join(format!("{prefix}_{n}.mp4"));
        fs::write(&path, format!("{resolution} {bitrate}"))?;
        self.created.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

fn read_artifact(path: &Path) -> Option<(Resolution, u64)> {
    let content = fs::read_to_string(path).ok()?;
    let (resolution, bitrate) = content.split_once(' ')?;
    Some((resolution.parse().ok()?, bitrate.trim().parse().ok()?))
}

impl Prober for FakeTools {
    fn probe(&self, path: &Path) -> CoreResult<ProbeInfo> {
        match read_artifact(path) {
            Some((resolution, bitrate)) => Ok(ProbeInfo {
                width: resolution.width,
                height: resolution.height,
                bitrate: Some(bitrate),
                ..self.source.clone()
            }),
            None => Ok(self.source.clone()),
        }
    }
}

impl ConstantQualityEncoder for FakeTools {
    fn encode_crf(
        &self,
        _input: &Path,
        resolution: Resolution,
        _quality: u8,
        _idr_interval_frames: u32,
        window: TimeWindow,
    ) -> CoreResult<PathBuf> {
        let bitrate = (self.crf_bitrate)(resolution, window)?;
        self.write_artifact("crf", resolution, bitrate)
    }
}

impl ConstantBitrateEncoder for FakeTools {
    fn encode_cbr(
        &self,
        _input: &Path,
        resolution: Resolution,
        bitrate: u64,
        _idr_interval_frames: u32,
        _window: TimeWindow,
    ) -> CoreResult<PathBuf> {
        self.write_artifact("cbr", resolution, bitrate)
    }
}

impl QualityScorer for FakeTools {
    fn score(
        &self,
        _kind: MetricKind,
        candidate: &Path,
        _reference: &Path,
        _reference_resolution: Resolution,
    ) -> CoreResult<f64> {
        let (resolution, bitrate) = read_artifact(candidate)
            .ok_or_else(|| CoreError::Score(format!("unreadable candidate {}", candidate.display())))?;
        (self.quality)(resolution, bitrate)
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct Recorder(pub Mutex<Vec<Event>>);

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

impl EventHandler for Recorder {
    fn handle(&self, event: &Event) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// A 100 second 1080p25 source.
pub fn source_info() -> ProbeInfo {
    ProbeInfo {
        duration: 100.0,
        framerate: 25,
        width: 1920,
        height: 1080,
        bitrate: Some(8_000_000),
    }
}

pub fn create_dummy_input(dir: &Path) -> PathBuf {
    let path = dir.join("title.mp4");
    fs::write(&path, b"source").expect("Failed to write dummy input");
    path
}

/// 1080p (required), 540p (required), 270p (optional) with factors 1, 4 and 8.
pub fn three_tier_ladder() -> EncodingLadder {
    EncodingLadder::new(vec![
        EncodingProfile::new(1920, 1080, 4_000_000, 1_000_000, 6_000_000, true, None).unwrap(),
        EncodingProfile::new(960, 540, 1_000_000, 300_000, 3_000_000, true, None).unwrap(),
        EncodingProfile::new(480, 270, 500_000, 200_000, 1_000_000, false, None).unwrap(),
    ])
    .unwrap()
}
