//! Per-session adaptive-bitrate control loop.
//!
//! A [`SessionController`] owns one playback session end to end: it hands the
//! transport adapter a [`SegmentRequest`], consumes the adapter's
//! [`ProgressEvent`]s, drives the playback-buffer model and the smoothing
//! windows, asks the decision policy for the next representation after every
//! completed or timed-out segment, and persists one [`MetricRecord`] per
//! observation through a [`MetricsSink`].
//!
//! The controller never waits and performs no transport I/O; adapters own
//! all blocking and report back. Time enters through explicit `Instant`
//! arguments so the loop stays deterministic under test.
//!
//! ```
//! use std::time::Instant;
//!
//! use chrono::Utc;
//! use pelorus_abr::{AbrPolicy, Ladder, Representation};
//! use pelorus_session::{
//!     NullSink, ProgressEvent, SegmentOutcome, SessionConfig, SessionController,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ladder = Ladder::new(vec![
//!     Representation::new("360p", 500_000),
//!     Representation::new("720p", 1_000_000),
//! ])?;
//! let mut session = SessionController::new(
//!     ladder,
//!     AbrPolicy::threshold(),
//!     SessionConfig::new(2),
//!     Box::new(NullSink),
//! );
//!
//! let now = Instant::now();
//! let request = session.begin_segment(now)?;
//!
//! // 500 kB in one second: 4 Mbps, enough to switch up for segment 1
//! let done = ProgressEvent::completed(
//!     request.segment_index,
//!     request.representation.id.clone(),
//!     500_000,
//!     1.0,
//!     Utc::now(),
//! );
//! match session.on_progress(&done, now)? {
//!     SegmentOutcome::Advanced { decision } => assert_eq!(decision.target.id, "720p"),
//!     outcome => panic!("unexpected outcome: {outcome:?}"),
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod observation;
pub mod record;
pub mod recorder;
pub mod rtt;
pub mod sink;

pub use buffer::{BufferUpdate, PlaybackBuffer};
pub use config::{
    SessionConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_RTT_WINDOW, DEFAULT_SEGMENT_DURATION_SECS,
    DEFAULT_SEGMENT_TIMEOUT, DEFAULT_THROUGHPUT_WINDOW,
};
pub use controller::{SegmentOutcome, SegmentRequest, SessionController, SessionState};
pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use observation::ProgressEvent;
pub use record::{MetricRecord, SessionSummary, Stats};
pub use recorder::{MetricsRecorder, Recorded};
pub use rtt::{
    elapsed_as_rtt, payload_scaled, RttEstimator, DEFAULT_RTT_FRACTION,
    DEFAULT_SMALL_PAYLOAD_BYTES,
};
pub use sink::{JsonlSink, MetricsSink, NullSink};
