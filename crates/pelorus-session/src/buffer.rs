use std::time::Instant;

use crate::error::{SessionError, SessionResult};

/// Result of one buffer update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BufferUpdate {
    /// A stall began during this update.
    pub stall_started: bool,
    /// A stall ended during this update; holds its duration in seconds.
    pub stall_ended_secs: Option<f64>,
}

/// Simulated playback buffer driven by segment-duration credits and
/// elapsed-time debits.
///
/// Two logical states: Playing (`level_secs > 0` or a segment was just
/// credited) and Stalled (`stall_started_at` is set). `level_secs` never goes
/// negative. Mutated only through [`PlaybackBuffer::update`].
#[derive(Debug, Clone)]
pub struct PlaybackBuffer {
    level_secs: f64,
    rebuffer_count: u64,
    total_rebuffer_secs: f64,
    stall_started_at: Option<Instant>,
}

impl PlaybackBuffer {
    pub fn new() -> Self {
        Self {
            level_secs: 0.0,
            rebuffer_count: 0,
            total_rebuffer_secs: 0.0,
            stall_started_at: None,
        }
    }

    /// Apply one observation to the buffer.
    ///
    /// Order matters: the debit happens before the credit so a just-arrived
    /// segment cannot mask a stall that occurred while it was in flight, and
    /// the credit happens after the stall check so a single call can both
    /// detect and resolve a stall.
    ///
    /// Partial observations pass `segment_complete = false`: they debit
    /// elapsed time but never credit.
    pub fn update(
        &mut self,
        now: Instant,
        elapsed_secs: f64,
        segment_duration_secs: f64,
        segment_complete: bool,
    ) -> SessionResult<BufferUpdate> {
        if elapsed_secs < 0.0 {
            return Err(SessionError::NegativeElapsed(elapsed_secs));
        }

        let mut update = BufferUpdate::default();

        // 1. Debit playback time consumed while the segment was in flight.
        if self.level_secs > 0.0 {
            self.level_secs = (self.level_secs - elapsed_secs).max(0.0);
        }

        // 2. Detect a stall exactly once per depleted interval.
        if self.level_secs <= 0.0 && self.stall_started_at.is_none() {
            self.stall_started_at = Some(now);
            self.rebuffer_count += 1;
            update.stall_started = true;
            tracing::warn!(rebuffer_count = self.rebuffer_count, "playback stalled");
        }

        // 3. Credit the buffer for a completed segment; a credit can end a
        //    stall within the same call.
        if segment_complete {
            self.level_secs += segment_duration_secs;
        }

        // 4. Close the stall once the buffer is above zero again.
        if self.level_secs > 0.0 {
            if let Some(started) = self.stall_started_at.take() {
                let stalled = now.duration_since(started).as_secs_f64();
                self.total_rebuffer_secs += stalled;
                update.stall_ended_secs = Some(stalled);
                tracing::debug!(
                    stalled_secs = stalled,
                    total_rebuffer_secs = self.total_rebuffer_secs,
                    "playback resumed"
                );
            }
        }

        Ok(update)
    }

    pub fn level_secs(&self) -> f64 {
        self.level_secs
    }

    pub fn rebuffer_count(&self) -> u64 {
        self.rebuffer_count
    }

    pub fn total_rebuffer_secs(&self) -> f64 {
        self.total_rebuffer_secs
    }

    pub fn is_stalled(&self) -> bool {
        self.stall_started_at.is_some()
    }
}

impl Default for PlaybackBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn initial_update_detects_stall_and_resolves_on_credit() {
        let mut buf = PlaybackBuffer::new();
        let now = t0();

        // empty buffer, segment arrives after 1s: stall detected, then credited
        let u = buf.update(now, 1.0, 2.0, true).unwrap();
        assert!(u.stall_started);
        assert_eq!(u.stall_ended_secs, Some(0.0));
        assert_eq!(buf.level_secs(), 2.0);
        assert_eq!(buf.rebuffer_count(), 1);
        assert!(!buf.is_stalled());
    }

    #[test]
    fn level_never_goes_negative() {
        let mut buf = PlaybackBuffer::new();
        let now = t0();
        buf.update(now, 0.5, 2.0, true).unwrap();
        assert_eq!(buf.level_secs(), 2.0);

        // debit far exceeding the level clamps at zero
        buf.update(now + Duration::from_secs(10), 100.0, 2.0, false)
            .unwrap();
        assert_eq!(buf.level_secs(), 0.0);
    }

    #[test]
    fn stall_counted_once_across_partial_observations() {
        let mut buf = PlaybackBuffer::new();
        let base = t0();

        let u1 = buf.update(base, 0.5, 2.0, false).unwrap();
        assert!(u1.stall_started);
        assert_eq!(buf.rebuffer_count(), 1);

        // further partials during the same depleted interval do not re-count
        let u2 = buf
            .update(base + Duration::from_millis(500), 1.0, 2.0, false)
            .unwrap();
        assert!(!u2.stall_started);
        let u3 = buf
            .update(base + Duration::from_millis(900), 1.4, 2.0, false)
            .unwrap();
        assert!(!u3.stall_started);
        assert_eq!(buf.rebuffer_count(), 1);
        assert!(buf.is_stalled());
    }

    #[test]
    fn stall_duration_accumulates_between_detection_and_resolution() {
        let mut buf = PlaybackBuffer::new();
        let base = t0();

        let u = buf.update(base, 1.0, 2.0, false).unwrap();
        assert!(u.stall_started);

        // completion 3 seconds later closes the stall
        let u = buf.update(base + Duration::from_secs(3), 0.0, 2.0, true).unwrap();
        assert_eq!(u.stall_ended_secs, Some(3.0));
        assert_eq!(buf.total_rebuffer_secs(), 3.0);
        assert!(!buf.is_stalled());

        // drain and stall again; totals only ever grow
        buf.update(base + Duration::from_secs(10), 5.0, 2.0, false)
            .unwrap();
        assert_eq!(buf.rebuffer_count(), 2);
        buf.update(base + Duration::from_secs(12), 0.0, 2.0, true).unwrap();
        assert_eq!(buf.total_rebuffer_secs(), 5.0);
    }

    #[test]
    fn partial_observations_never_credit() {
        let mut buf = PlaybackBuffer::new();
        let now = t0();
        buf.update(now, 0.0, 2.0, true).unwrap();
        assert_eq!(buf.level_secs(), 2.0);

        buf.update(now + Duration::from_secs(1), 1.0, 2.0, false).unwrap();
        assert_eq!(buf.level_secs(), 1.0);
    }

    #[test]
    fn healthy_buffer_debits_without_stalling() {
        let mut buf = PlaybackBuffer::new();
        let now = t0();
        buf.update(now, 0.0, 2.0, true).unwrap();
        let u = buf.update(now + Duration::from_secs(1), 0.5, 2.0, true).unwrap();
        assert!(!u.stall_started);
        assert_eq!(u.stall_ended_secs, None);
        assert_eq!(buf.level_secs(), 3.5);
        assert_eq!(buf.rebuffer_count(), 1); // only the initial cold-start stall
    }

    #[test]
    fn negative_elapsed_rejected() {
        let mut buf = PlaybackBuffer::new();
        let err = buf.update(t0(), -0.1, 2.0, true).unwrap_err();
        assert!(matches!(err, SessionError::NegativeElapsed(_)));
    }
}
