use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable metrics snapshot per observation.
///
/// Field order is the canonical persisted schema consumed by the downstream
/// analysis tooling; do not reorder. Records are created and appended exactly
/// once, never mutated, and persisted in creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub segment_index: u64,
    pub representation_id: String,
    pub bitrate_bps: u64,
    pub bytes: u64,
    pub elapsed_secs: f64,
    pub throughput_bps: f64,
    pub smoothed_throughput_bps: f64,
    pub rtt_secs: f64,
    pub buffer_level_secs: f64,
    pub rebuffer_count: u64,
    pub total_rebuffer_secs: f64,
    pub playback_position_secs: f64,
    pub is_rebuffering: bool,
    pub bitrate_switch: bool,
    pub goodput_bps: f64,
    pub loss_estimate: f64,
    /// False for partial observations and timed-out segments.
    pub is_complete: bool,
}

/// Min/max/mean over a series of recorded values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Stats {
    /// Compute stats over `values`; all-zero when the iterator is empty.
    pub fn compute(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0u64;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            mean: sum / count as f64,
        }
    }
}

/// End-of-session aggregate, persisted once when the session finishes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Total metric records, including partial-observation rows.
    pub records: u64,
    /// Segments that reported a final observation.
    pub completed_segments: u64,
    pub rebuffer_count: u64,
    pub total_rebuffer_secs: f64,
    /// Over records with non-zero throughput.
    pub throughput_bps: Stats,
    /// Over records with non-zero RTT.
    pub rtt_secs: Stats,
    /// Over all records.
    pub buffer_level_secs: Stats,
    pub bitrate_switches: u64,
    /// `sum(goodput) / sum(throughput)`, zero when nothing was recorded.
    pub goodput_efficiency: f64,
}
