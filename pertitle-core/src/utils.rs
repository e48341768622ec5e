//! Utility functions for formatting and parsing.
//!
//! This module provides small helpers used by the adapters, the result
//! assembler and the CLI: bitrate and duration formatting, frame-rate parsing
//! and savings percentages.

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bits per second with decimal units (bps, kbps, Mbps).
#[must_use]
pub fn format_bitrate(bits_per_second: u64) -> String {
    const KBPS: f64 = 1_000.0;
    const MBPS: f64 = KBPS * 1_000.0;

    let value = bits_per_second as f64;
    if value >= MBPS {
        format!("{:.2} Mbps", value / MBPS)
    } else if value >= KBPS {
        format!("{:.0} kbps", value / KBPS)
    } else {
        format!("{bits_per_second} bps")
    }
}

/// Formats a signed bitrate difference, keeping the sign for negative savings.
#[must_use]
pub fn format_bitrate_delta(delta: i64) -> String {
    if delta < 0 {
        format!("-{}", format_bitrate(delta.unsigned_abs()))
    } else {
        format_bitrate(delta as u64)
    }
}

/// Parses an ffprobe frame rate ("30000/1001", "25/1" or "29.97"). Returns None
/// for malformed input or a zero denominator.
#[must_use]
pub fn parse_frame_rate(frame_rate: &str) -> Option<f64> {
    let frame_rate = frame_rate.trim();
    if let Some((num, den)) = frame_rate.split_once('/') {
        let numerator: f64 = num.trim().parse().ok()?;
        let denominator: f64 = den.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }
    frame_rate.parse().ok()
}

/// Percentage of `saved` relative to `total`. Returns 0.0 when `total` is 0.
#[must_use]
pub fn savings_percent(total: u64, saved: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        saved as f64 / total as f64 * 100.0
    }
}
