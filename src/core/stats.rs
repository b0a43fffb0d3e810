//! Rolling inference timing.
//!
//! Each detection call is timed with `begin`/`end`. Samples accumulate and
//! are averaged and published about once per second.

use log::debug;
use std::time::{Duration, Instant};

/// How often the average is published
pub const REPORT_INTERVAL: Duration = Duration::from_millis(1000);

/// Published average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSample {
    pub average_ms: f32,
    /// 1000 / average_ms
    pub fps: f32,
    pub samples: u32,
}

#[derive(Debug, Clone)]
pub struct InferenceStats {
    interval: Duration,
    started: Option<Instant>,
    window_start: Option<Instant>,
    total: Duration,
    count: u32,
    latest: Option<StatsSample>,
}

impl Default for InferenceStats {
    fn default() -> Self {
        Self::new(REPORT_INTERVAL)
    }
}

impl InferenceStats {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: None,
            window_start: None,
            total: Duration::ZERO,
            count: 0,
            latest: None,
        }
    }

    /// Mark the start of a detection call
    pub fn begin(&mut self, now: Instant) {
        self.started = Some(now);
        if self.window_start.is_none() {
            self.window_start = Some(now);
        }
    }

    /// Mark the end of a detection call. Returns a new sample when the
    /// report interval has elapsed.
    pub fn end(&mut self, now: Instant) -> Option<StatsSample> {
        let started = self.started.take()?;
        self.total += now.saturating_duration_since(started);
        self.count += 1;

        let window_start = self.window_start?;
        if now.saturating_duration_since(window_start) < self.interval {
            return None;
        }

        let average_ms = self.total.as_secs_f32() * 1000.0 / self.count as f32;
        let fps = if average_ms > 0.0 { 1000.0 / average_ms } else { 0.0 };
        let sample = StatsSample {
            average_ms,
            fps,
            samples: self.count,
        };
        debug!("Inference: {:.1} ms avg over {} calls, {:.1} fps", average_ms, self.count, fps);
        self.latest = Some(sample);
        self.total = Duration::ZERO;
        self.count = 0;
        self.window_start = Some(now);
        Some(sample)
    }

    /// Drop an unfinished measurement (failed call)
    pub fn abort(&mut self) {
        self.started = None;
    }

    /// Last published sample
    pub fn latest(&self) -> Option<StatsSample> {
        self.latest
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.interval);
    }
}
