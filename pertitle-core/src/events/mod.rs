//! Progress reporting for analysis runs.
//!
//! The decision engine never logs. It reports what it is doing through
//! [`Event`]s sent to every registered [`EventHandler`]; the CLI renders them
//! as a progress bar, log lines or JSON.

use std::sync::Arc;
use std::time::Duration;

pub mod json_handler;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A run started. `measurements` is the number of encode+measure steps planned.
    AnalysisStarted {
        method: String,
        input_file: String,
        tiers: usize,
        measurements: usize,
    },

    ProbeCompleted {
        duration: f64,
        framerate: u32,
        resolution: String,
    },

    /// One CRF window was encoded and its bitrate probed.
    SegmentMeasured {
        resolution: String,
        index: usize,
        total: usize,
        bitrate: u64,
    },

    /// One CBR candidate was encoded and scored.
    SweepPointMeasured {
        resolution: String,
        bitrate: u64,
        quality: f64,
    },

    TierCompleted {
        resolution: String,
        bitrate: u64,
        retained: bool,
        savings: i64,
    },

    /// A metric tier aborted; the run continues with the next tier.
    TierFailed {
        resolution: String,
        message: String,
    },

    /// A measurement artifact could not be deleted after its measurement.
    ArtifactCleanupFailed {
        path: String,
        message: String,
    },

    AnalysisCompleted {
        method: String,
        overall_bitrate_default: u64,
        overall_bitrate_optimized: u64,
        total_time: Duration,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

#[derive(Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
