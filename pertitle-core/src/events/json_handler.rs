//! JSON progress handler for structured progress output
//!
//! This module provides a JSON-based event handler that writes one JSON
//! object per line for consumption by pipeline tooling.

use super::{Event, EventHandler};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs progress events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            Event::AnalysisStarted {
                method,
                input_file,
                tiers,
                measurements,
            } => json!({
                "type": "analysis_started",
                "method": method,
                "input_file": input_file,
                "tiers": tiers,
                "measurements": measurements,
                "timestamp": timestamp
            }),

            Event::ProbeCompleted {
                duration,
                framerate,
                resolution,
            } => json!({
                "type": "probe_completed",
                "duration_seconds": duration,
                "framerate": framerate,
                "resolution": resolution,
                "timestamp": timestamp
            }),

            Event::SegmentMeasured {
                resolution,
                index,
                total,
                bitrate,
            } => json!({
                "type": "segment_measured",
                "resolution": resolution,
                "segment": index + 1,
                "total_segments": total,
                "bitrate": bitrate,
                "timestamp": timestamp
            }),

            Event::SweepPointMeasured {
                resolution,
                bitrate,
                quality,
            } => json!({
                "type": "sweep_point_measured",
                "resolution": resolution,
                "bitrate": bitrate,
                "quality": quality,
                "timestamp": timestamp
            }),

            Event::TierCompleted {
                resolution,
                bitrate,
                retained,
                savings,
            } => json!({
                "type": "tier_completed",
                "resolution": resolution,
                "bitrate": bitrate,
                "retained": retained,
                "savings": savings,
                "timestamp": timestamp
            }),

            Event::TierFailed { resolution, message } => json!({
                "type": "tier_failed",
                "resolution": resolution,
                "message": message,
                "timestamp": timestamp
            }),

            Event::ArtifactCleanupFailed { path, message } => json!({
                "type": "artifact_cleanup_failed",
                "path": path,
                "message": message,
                "timestamp": timestamp
            }),

            Event::AnalysisCompleted {
                method,
                overall_bitrate_default,
                overall_bitrate_optimized,
                total_time,
            } => json!({
                "type": "analysis_completed",
                "method": method,
                "overall_bitrate_default": overall_bitrate_default,
                "overall_bitrate_optimized": overall_bitrate_optimized,
                "duration_seconds": total_time.as_secs_f64(),
                "timestamp": timestamp
            }),
        };

        self.write_json(value);
    }
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct MockWriter {
        content: Arc<Mutex<Vec<u8>>>,
    }

    impl MockWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let content = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    content: content.clone(),
                },
                content,
            )
        }
    }

    impl Write for MockWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.content.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines(content: &Arc<Mutex<Vec<u8>>>) -> Vec<serde_json::Value> {
        let output = String::from_utf8(content.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_segment_measured_json() {
        let (writer, content) = MockWriter::new();
        let handler = JsonProgressHandler::with_writer(Box::new(writer));

        handler.handle(&Event::SegmentMeasured {
            resolution: "1920x1080".to_string(),
            index: 2,
            total: 10,
            bitrate: 3_200_000,
        });

        let parsed = lines(&content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["type"], "segment_measured");
        assert_eq!(parsed[0]["segment"], 3);
        assert_eq!(parsed[0]["total_segments"], 10);
        assert_eq!(parsed[0]["bitrate"], 3_200_000);
    }

    #[test]
    fn test_one_line_per_event() {
        let (writer, content) = MockWriter::new();
        let handler = JsonProgressHandler::with_writer(Box::new(writer));

        handler.handle(&Event::TierFailed {
            resolution: "480x270".to_string(),
            message: "Encode error: exit 1".to_string(),
        });
        handler.handle(&Event::AnalysisCompleted {
            method: "Metric".to_string(),
            overall_bitrate_default: 11_850_000,
            overall_bitrate_optimized: 9_000_000,
            total_time: Duration::from_secs(12),
        });

        let parsed = lines(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["type"], "tier_failed");
        assert_eq!(parsed[0]["message"], "Encode error: exit 1");
        assert_eq!(parsed[1]["type"], "analysis_completed");
        assert_eq!(parsed[1]["duration_seconds"], 12.0);
    }
}
