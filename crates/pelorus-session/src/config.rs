use std::{fmt, time::Duration};

use crate::rtt::{self, RttEstimator};

pub const DEFAULT_SEGMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEGMENT_DURATION_SECS: f64 = 2.0;
pub const DEFAULT_THROUGHPUT_WINDOW: usize = 5;
pub const DEFAULT_RTT_WINDOW: usize = 10;
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Per-session tuning knobs.
#[derive(Clone)]
pub struct SessionConfig {
    /// Number of segment indices in the session's plan.
    pub total_segments: u64,
    /// Nominal playback duration credited per completed segment.
    pub segment_duration_secs: f64,
    /// Wall-clock budget for a segment to report its final observation.
    pub segment_timeout: Duration,
    pub throughput_window: usize,
    pub rtt_window: usize,
    pub rtt_estimator: RttEstimator,
    /// Broadcast channel capacity for session events.
    pub event_capacity: usize,
}

impl SessionConfig {
    pub fn new(total_segments: u64) -> Self {
        Self {
            total_segments,
            ..Self::default()
        }
    }

    pub fn with_segment_duration_secs(mut self, secs: f64) -> Self {
        self.segment_duration_secs = secs;
        self
    }

    pub fn with_segment_timeout(mut self, timeout: Duration) -> Self {
        self.segment_timeout = timeout;
        self
    }

    pub fn with_throughput_window(mut self, capacity: usize) -> Self {
        self.throughput_window = capacity;
        self
    }

    pub fn with_rtt_window(mut self, capacity: usize) -> Self {
        self.rtt_window = capacity;
        self
    }

    pub fn with_rtt_estimator(mut self, estimator: RttEstimator) -> Self {
        self.rtt_estimator = estimator;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_segments: 1,
            segment_duration_secs: DEFAULT_SEGMENT_DURATION_SECS,
            segment_timeout: DEFAULT_SEGMENT_TIMEOUT,
            throughput_window: DEFAULT_THROUGHPUT_WINDOW,
            rtt_window: DEFAULT_RTT_WINDOW,
            rtt_estimator: rtt::elapsed_as_rtt(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

// rtt_estimator is a closure, so Debug is spelled out by hand.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("total_segments", &self.total_segments)
            .field("segment_duration_secs", &self.segment_duration_secs)
            .field("segment_timeout", &self.segment_timeout)
            .field("throughput_window", &self.throughput_window)
            .field("rtt_window", &self.rtt_window)
            .field("event_capacity", &self.event_capacity)
            .finish_non_exhaustive()
    }
}
