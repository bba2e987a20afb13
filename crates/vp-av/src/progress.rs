//! Progress tracking for a running transcode.
//!
//! Parses the line-oriented `key=value` stream ffmpeg emits under
//! `-progress`, converting elapsed-time keys into debounced percent-complete
//! events.  The debounce bounds write pressure on the job store.
//!
//! The clock is passed in explicitly ([`ProgressTracker::push_at`]) so tests
//! can drive a synthetic timeline; [`ProgressTracker::push`] is the
//! wall-clock convenience used by the encode runner.

use std::time::{Duration, Instant};

/// Minimum real time between two emissions.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Debounced percent-complete tracker over an ffmpeg progress stream.
#[derive(Debug)]
pub struct ProgressTracker {
    total_secs: f64,
    last_percent: Option<i64>,
    last_emit: Option<Instant>,
}

impl ProgressTracker {
    /// Create a tracker for a source of the given total duration.
    pub fn new(total_secs: f64) -> Self {
        Self {
            total_secs,
            last_percent: None,
            last_emit: None,
        }
    }

    /// Feed one stream line; returns a percent to persist if one is due.
    pub fn push(&mut self, line: &str) -> Option<i64> {
        self.push_at(line, Instant::now())
    }

    /// Feed one stream line at an explicit point in time.
    ///
    /// Emits `min(100, floor(elapsed / total * 100))` only when the percent
    /// differs from the last emission and at least 0.5 s have passed since
    /// it.
    pub fn push_at(&mut self, line: &str, now: Instant) -> Option<i64> {
        let elapsed = self.parse_elapsed(line)?;
        if self.total_secs <= 0.0 {
            return None;
        }

        let percent = ((elapsed / self.total_secs) * 100.0).floor() as i64;
        let percent = percent.min(100);

        if Some(percent) == self.last_percent {
            return None;
        }
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < DEBOUNCE {
                return None;
            }
        }

        self.last_percent = Some(percent);
        self.last_emit = Some(now);
        Some(percent)
    }

    /// Extract elapsed seconds from a recognized progress key, if any.
    ///
    /// ffmpeg's `out_time_ms` key actually carries microseconds, matching
    /// `out_time_us`; both are accepted.  The `progress=end` marker maps to
    /// the full duration.
    fn parse_elapsed(&self, line: &str) -> Option<f64> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            "out_time_us" | "out_time_ms" => {
                let us: i64 = value.trim().parse().ok()?;
                Some(us as f64 / 1_000_000.0)
            }
            "out_time" => Some(parse_timecode(value.trim())),
            "progress" if value.trim() == "end" => Some(self.total_secs),
            _ => None,
        }
    }
}

/// Parse an `H:MM:SS.fraction` timecode into seconds; 0.0 on malformed input.
fn parse_timecode(value: &str) -> f64 {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }
    let hours: f64 = parts[0].parse().unwrap_or(0.0);
    let minutes: f64 = parts[1].parse().unwrap_or(0.0);
    let seconds: f64 = parts[2].parse().unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds
}
