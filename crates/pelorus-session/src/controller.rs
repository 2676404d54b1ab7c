use std::time::Instant;

use chrono::Utc;
use pelorus_abr::{AbrDecision, AbrError, AbrPolicy, Ladder, Representation};
use tokio::sync::broadcast;

use crate::{
    config::SessionConfig,
    error::{SessionError, SessionResult},
    events::SessionEvent,
    observation::ProgressEvent,
    record::SessionSummary,
    recorder::MetricsRecorder,
    sink::MetricsSink,
};

/// Externally observable controller states.
///
/// The transient `Completed`/`TimedOut`/`Deciding` leg of the loop collapses
/// inside a single `on_progress`/`on_timeout` call; between calls the
/// controller rests in one of these.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Ready to request the next segment index.
    Idle,
    /// A segment is in flight; waiting on transport progress.
    Awaiting,
    /// The plan is exhausted or the session was aborted.
    Finished,
}

/// What the adapter should fetch next.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRequest {
    pub segment_index: u64,
    pub representation: Representation,
    /// Monotonic deadline; past it the adapter must call
    /// [`SessionController::on_timeout`] instead of waiting further.
    pub deadline: Instant,
}

/// Result of consuming one observation or timeout.
#[derive(Clone, Debug)]
pub enum SegmentOutcome {
    /// A partial observation was recorded; the segment is still in flight
    /// and no decision was made.
    InFlight,
    /// The segment finished (or timed out); `decision` names the
    /// representation for the next segment index.
    Advanced { decision: AbrDecision },
    /// The segment finished and it was the last one in the plan; the summary
    /// has been persisted.
    Finished {
        decision: AbrDecision,
        summary: SessionSummary,
    },
}

struct InFlight {
    segment_index: u64,
    representation: Representation,
    deadline: Instant,
    bytes_so_far: u64,
}

/// Sequential per-session decision loop.
///
/// Owns every piece of mutable session state: the playback buffer, the sample
/// windows and the metric log all live behind this controller, and at most
/// one segment is in flight at a time. The controller performs no I/O beyond
/// the metrics sink and never waits; all waiting belongs to the transport
/// adapter driving it.
///
/// A segment index is attempted at most once. A timed-out segment is recorded
/// as incomplete and the loop advances past it; retry policy, if any, belongs
/// to the adapter.
pub struct SessionController {
    ladder: Ladder,
    policy: AbrPolicy,
    config: SessionConfig,
    recorder: MetricsRecorder,
    events: broadcast::Sender<SessionEvent>,
    state: SessionState,
    current: Representation,
    next_segment: u64,
    in_flight: Option<InFlight>,
}

impl SessionController {
    /// Sessions start on the lowest rung and climb on evidence.
    pub fn new(
        ladder: Ladder,
        policy: AbrPolicy,
        config: SessionConfig,
        sink: Box<dyn MetricsSink>,
    ) -> Self {
        let recorder = MetricsRecorder::new(
            config.throughput_window,
            config.rtt_window,
            config.rtt_estimator.clone(),
            config.segment_duration_secs,
            sink,
        );
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let current = ladder.lowest().clone();
        let state = if config.total_segments == 0 {
            SessionState::Finished
        } else {
            SessionState::Idle
        };
        Self {
            ladder,
            policy,
            config,
            recorder,
            events,
            state,
            current,
            next_segment: 0,
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_representation(&self) -> &Representation {
        &self.current
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.recorder
    }

    /// Start the next segment index; valid only while [`SessionState::Idle`].
    pub fn begin_segment(&mut self, now: Instant) -> SessionResult<SegmentRequest> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                op: "begin_segment",
            });
        }

        let request = SegmentRequest {
            segment_index: self.next_segment,
            representation: self.current.clone(),
            deadline: now + self.config.segment_timeout,
        };
        self.in_flight = Some(InFlight {
            segment_index: request.segment_index,
            representation: request.representation.clone(),
            deadline: request.deadline,
            bytes_so_far: 0,
        });
        self.state = SessionState::Awaiting;

        tracing::debug!(
            segment_index = request.segment_index,
            representation = %request.representation.id,
            "segment requested"
        );
        self.emit(SessionEvent::SegmentRequested {
            segment_index: request.segment_index,
            representation_id: request.representation.id.clone(),
        });
        Ok(request)
    }

    /// Consume one transport observation for the in-flight segment.
    ///
    /// Partial observations update the windows and the buffer but never
    /// trigger a decision; the decision runs when `is_final` is set.
    pub fn on_progress(
        &mut self,
        event: &ProgressEvent,
        now: Instant,
    ) -> SessionResult<SegmentOutcome> {
        if self.state != SessionState::Awaiting {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                op: "on_progress",
            });
        }
        let expected = self.active_segment();
        if event.segment_index != expected {
            return Err(SessionError::SegmentIndexMismatch {
                expected,
                got: event.segment_index,
            });
        }

        let representation = self.active_representation();
        if event.representation_id != representation.id {
            // never coerce a wrong id onto the requested rung
            if self.ladder.get(&event.representation_id).is_none() {
                return Err(
                    AbrError::UnknownRepresentation(event.representation_id.clone()).into(),
                );
            }
            return Err(SessionError::RepresentationMismatch {
                expected: representation.id.clone(),
                got: event.representation_id.clone(),
            });
        }

        let recorded = self.recorder.record(event, &representation, now)?;
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.bytes_so_far = event.bytes;
        }
        self.emit_buffer_events(event.segment_index, &recorded.buffer);

        if !event.is_final {
            return Ok(SegmentOutcome::InFlight);
        }

        self.emit(SessionEvent::SegmentCompleted {
            segment_index: event.segment_index,
            representation_id: representation.id.clone(),
            throughput_bps: recorded.record.throughput_bps,
        });
        self.in_flight = None;
        self.decide_and_advance()
    }

    /// True once the in-flight segment's deadline has passed.
    pub fn timed_out(&self, now: Instant) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| now >= f.deadline)
    }

    /// Give up on the in-flight segment.
    ///
    /// Records exactly one incomplete metric carrying the timeout duration as
    /// elapsed time and whatever bytes were observed, then advances to the
    /// next segment index like any completed segment would.
    pub fn on_timeout(&mut self, now: Instant) -> SessionResult<SegmentOutcome> {
        if self.state != SessionState::Awaiting {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                op: "on_timeout",
            });
        }

        let (segment_index, bytes_so_far) = self.record_timeout(now)?;
        tracing::warn!(segment_index, bytes_so_far, "segment timed out");
        self.decide_and_advance()
    }

    /// Tear the session down mid-flight.
    ///
    /// An in-flight segment still produces its timeout-shaped record; the
    /// in-flight observation is never silently dropped. The summary is
    /// persisted before the controller goes [`SessionState::Finished`].
    pub fn abort(&mut self, now: Instant) -> SessionResult<SessionSummary> {
        match self.state {
            SessionState::Finished => {
                return Err(SessionError::InvalidTransition {
                    state: self.state,
                    op: "abort",
                })
            }
            SessionState::Awaiting => {
                let (segment_index, bytes_so_far) = self.record_timeout(now)?;
                tracing::warn!(segment_index, bytes_so_far, "session aborted mid-segment");
            }
            SessionState::Idle => {}
        }
        self.finish()
    }

    fn active_segment(&self) -> u64 {
        // only called while Awaiting, where in_flight is always set
        self.in_flight
            .as_ref()
            .map(|f| f.segment_index)
            .unwrap_or(self.next_segment)
    }

    fn active_representation(&self) -> Representation {
        self.in_flight
            .as_ref()
            .map(|f| f.representation.clone())
            .unwrap_or_else(|| self.current.clone())
    }

    fn record_timeout(&mut self, now: Instant) -> SessionResult<(u64, u64)> {
        let segment_index = self.active_segment();
        let representation = self.active_representation();
        let bytes_so_far = self
            .in_flight
            .as_ref()
            .map(|f| f.bytes_so_far)
            .unwrap_or(0);

        let synthetic = ProgressEvent::partial(
            segment_index,
            representation.id.clone(),
            bytes_so_far,
            self.config.segment_timeout.as_secs_f64(),
            Utc::now(),
        );
        let recorded = self.recorder.record(&synthetic, &representation, now)?;
        self.emit_buffer_events(segment_index, &recorded.buffer);
        self.emit(SessionEvent::SegmentTimedOut {
            segment_index,
            bytes_so_far,
        });
        self.in_flight = None;
        Ok((segment_index, bytes_so_far))
    }

    fn decide_and_advance(&mut self) -> SessionResult<SegmentOutcome> {
        let decision = self.policy.decide(
            &self.ladder,
            &self.current,
            self.recorder.smoothed_throughput_bps(),
        )?;
        if decision.changed {
            tracing::debug!(
                from = %self.current.id,
                to = %decision.target.id,
                reason = ?decision.reason,
                "representation switched"
            );
            self.emit(SessionEvent::RepresentationSwitched {
                from: self.current.id.clone(),
                to: decision.target.id.clone(),
                reason: decision.reason,
            });
            self.current = decision.target.clone();
        }

        self.next_segment += 1;
        if self.next_segment >= self.config.total_segments {
            let summary = self.finish()?;
            return Ok(SegmentOutcome::Finished { decision, summary });
        }
        self.state = SessionState::Idle;
        Ok(SegmentOutcome::Advanced { decision })
    }

    fn finish(&mut self) -> SessionResult<SessionSummary> {
        let summary = self.recorder.finalize()?;
        self.state = SessionState::Finished;
        tracing::info!(
            records = summary.records,
            completed_segments = summary.completed_segments,
            rebuffer_count = summary.rebuffer_count,
            bitrate_switches = summary.bitrate_switches,
            "session finished"
        );
        self.emit(SessionEvent::SessionFinished {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn emit_buffer_events(&self, segment_index: u64, update: &crate::buffer::BufferUpdate) {
        if update.stall_started {
            self.emit(SessionEvent::RebufferStarted { segment_index });
        }
        if let Some(stalled_secs) = update.stall_ended_secs {
            self.emit(SessionEvent::RebufferEnded { stalled_secs });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // no receivers is fine; events are best effort
        let _ = self.events.send(event);
    }
}
