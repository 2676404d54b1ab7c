use chrono::{DateTime, Utc};

/// One transport-reported download observation.
///
/// The chunked-HTTP path reports exactly one final observation per segment;
/// the multiplexed-stream path reports zero or more partials followed by one
/// final. Buffer accounting behaves identically under both cadences: partials
/// debit elapsed playback time but never credit segment duration.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    pub segment_index: u64,
    pub representation_id: String,
    /// Cumulative bytes observed for this segment so far.
    pub bytes: u64,
    /// Elapsed download time so far, in seconds. Negative values are
    /// rejected as a caller bug, never clamped.
    pub elapsed_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub is_first_chunk: bool,
    pub is_final: bool,
}

impl ProgressEvent {
    /// A completed-segment observation (the only kind the chunked-HTTP
    /// transport produces).
    pub fn completed(
        segment_index: u64,
        representation_id: impl Into<String>,
        bytes: u64,
        elapsed_secs: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            segment_index,
            representation_id: representation_id.into(),
            bytes,
            elapsed_secs,
            timestamp,
            is_first_chunk: false,
            is_final: true,
        }
    }

    /// An interim chunk observation from the multiplexed-stream transport.
    pub fn partial(
        segment_index: u64,
        representation_id: impl Into<String>,
        bytes: u64,
        elapsed_secs: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            segment_index,
            representation_id: representation_id.into(),
            bytes,
            elapsed_secs,
            timestamp,
            is_first_chunk: false,
            is_final: false,
        }
    }

    pub fn with_first_chunk(mut self) -> Self {
        self.is_first_chunk = true;
        self
    }
}
