use pelorus_abr::AbrReason;

use crate::record::SessionSummary;

/// Session lifecycle notifications, broadcast to any number of observers.
///
/// Emission is best effort: a lagging or absent receiver never blocks the
/// control loop.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    SegmentRequested {
        segment_index: u64,
        representation_id: String,
    },
    SegmentCompleted {
        segment_index: u64,
        representation_id: String,
        throughput_bps: f64,
    },
    /// The segment never reported a final observation in time; `bytes_so_far`
    /// is whatever partial count was observed, possibly zero.
    SegmentTimedOut {
        segment_index: u64,
        bytes_so_far: u64,
    },
    RebufferStarted {
        segment_index: u64,
    },
    RebufferEnded {
        stalled_secs: f64,
    },
    RepresentationSwitched {
        from: String,
        to: String,
        reason: AbrReason,
    },
    SessionFinished {
        summary: SessionSummary,
    },
}
