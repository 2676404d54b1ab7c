use std::time::Instant;

use pelorus_abr::{Representation, SampleWindow};

use crate::{
    buffer::{BufferUpdate, PlaybackBuffer},
    error::{SessionError, SessionResult},
    observation::ProgressEvent,
    record::{MetricRecord, SessionSummary, Stats},
    rtt::RttEstimator,
    sink::MetricsSink,
};

/// A recorded observation plus the buffer transitions it caused.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub record: MetricRecord,
    pub buffer: BufferUpdate,
}

/// Assembles one ordered metric record per observation.
///
/// Owns the smoothing windows, the playback buffer and the ordered in-memory
/// log; every record is appended to the sink before `record` returns, so a
/// crash mid-session loses at most the in-flight record.
pub struct MetricsRecorder {
    throughput: SampleWindow,
    rtt: SampleWindow,
    buffer: PlaybackBuffer,
    rtt_estimator: RttEstimator,
    segment_duration_secs: f64,
    playback_position_secs: f64,
    previous_bitrate_bps: u64,
    switch_count: u64,
    completed_segments: u64,
    log: Vec<MetricRecord>,
    sink: Box<dyn MetricsSink>,
}

impl MetricsRecorder {
    pub fn new(
        throughput_window: usize,
        rtt_window: usize,
        rtt_estimator: RttEstimator,
        segment_duration_secs: f64,
        sink: Box<dyn MetricsSink>,
    ) -> Self {
        Self {
            throughput: SampleWindow::new(throughput_window),
            rtt: SampleWindow::new(rtt_window),
            buffer: PlaybackBuffer::new(),
            rtt_estimator,
            segment_duration_secs,
            playback_position_secs: 0.0,
            previous_bitrate_bps: 0,
            switch_count: 0,
            completed_segments: 0,
            log: Vec::new(),
            sink,
        }
    }

    /// Record one observation against `representation`.
    ///
    /// `now` is the monotonic instant of the observation, used for stall
    /// timing; `event.timestamp` is the adapter's wall-clock stamp and is
    /// persisted verbatim.
    pub fn record(
        &mut self,
        event: &ProgressEvent,
        representation: &Representation,
        now: Instant,
    ) -> SessionResult<Recorded> {
        if event.elapsed_secs < 0.0 {
            return Err(SessionError::NegativeElapsed(event.elapsed_secs));
        }

        let throughput_bps = if event.elapsed_secs > 0.0 {
            (event.bytes as f64 * 8.0) / event.elapsed_secs
        } else {
            0.0
        };
        self.throughput.push(throughput_bps);
        let smoothed_throughput_bps = self.throughput.mean();

        let rtt_sample = (self.rtt_estimator)(event.bytes, event.elapsed_secs);
        self.rtt.push(rtt_sample);
        let rtt_secs = self.rtt.mean();

        let buffer_update = self.buffer.update(
            now,
            event.elapsed_secs,
            self.segment_duration_secs,
            event.is_final,
        )?;

        if event.is_final {
            self.playback_position_secs = event.segment_index as f64 * self.segment_duration_secs;
            self.completed_segments += 1;
        }

        let bitrate_switch = self.previous_bitrate_bps != 0
            && representation.bitrate_bps != self.previous_bitrate_bps;
        if bitrate_switch {
            self.switch_count += 1;
        }
        self.previous_bitrate_bps = representation.bitrate_bps;

        let goodput_bps = if representation.bitrate_bps > 0 {
            throughput_bps.min(representation.bitrate_bps as f64)
        } else {
            throughput_bps
        };

        let loss_estimate = self.loss_estimate();

        let record = MetricRecord {
            timestamp: event.timestamp,
            segment_index: event.segment_index,
            representation_id: representation.id.clone(),
            bitrate_bps: representation.bitrate_bps,
            bytes: event.bytes,
            elapsed_secs: event.elapsed_secs,
            throughput_bps,
            smoothed_throughput_bps,
            rtt_secs,
            buffer_level_secs: self.buffer.level_secs(),
            rebuffer_count: self.buffer.rebuffer_count(),
            total_rebuffer_secs: self.buffer.total_rebuffer_secs(),
            playback_position_secs: self.playback_position_secs,
            is_rebuffering: buffer_update.stall_started,
            bitrate_switch,
            goodput_bps,
            loss_estimate,
            is_complete: event.is_final,
        };

        tracing::trace!(
            segment_index = record.segment_index,
            representation = %record.representation_id,
            bytes = record.bytes,
            throughput_bps = record.throughput_bps,
            buffer_level_secs = record.buffer_level_secs,
            is_complete = record.is_complete,
            "metric recorded"
        );

        self.log.push(record.clone());
        self.sink.append(&record)?;

        Ok(Recorded {
            record,
            buffer: buffer_update,
        })
    }

    /// Normalized deviation of the latest throughput sample from the window
    /// mean, clamped to `[0, 1]`. A crude loss proxy: sustained deviation
    /// from the recent mean correlates with delivery trouble.
    fn loss_estimate(&self) -> f64 {
        if self.throughput.len() < 2 {
            return 0.0;
        }
        let mean = self.throughput.mean();
        if mean <= 0.0 {
            return 0.0;
        }
        let latest = self.throughput.latest().unwrap_or(0.0);
        ((latest - mean).abs() / mean).min(1.0)
    }

    pub fn smoothed_throughput_bps(&self) -> f64 {
        self.throughput.mean()
    }

    pub fn smoothed_rtt_secs(&self) -> f64 {
        self.rtt.mean()
    }

    pub fn buffer(&self) -> &PlaybackBuffer {
        &self.buffer
    }

    /// Ordered metric log, insertion order = arrival order.
    pub fn log(&self) -> &[MetricRecord] {
        &self.log
    }

    pub fn switch_count(&self) -> u64 {
        self.switch_count
    }

    /// Aggregate the session. All-zero summary for an empty log.
    pub fn summarize(&self) -> SessionSummary {
        if self.log.is_empty() {
            return SessionSummary::default();
        }

        let throughputs = || {
            self.log
                .iter()
                .map(|r| r.throughput_bps)
                .filter(|&t| t > 0.0)
        };
        let rtts = || self.log.iter().map(|r| r.rtt_secs).filter(|&t| t > 0.0);

        let total_throughput: f64 = throughputs().sum();
        let total_goodput: f64 = self
            .log
            .iter()
            .filter(|r| r.throughput_bps > 0.0)
            .map(|r| r.goodput_bps)
            .sum();
        let goodput_efficiency = if total_throughput > 0.0 {
            total_goodput / total_throughput
        } else {
            0.0
        };

        SessionSummary {
            records: self.log.len() as u64,
            completed_segments: self.completed_segments,
            rebuffer_count: self.buffer.rebuffer_count(),
            total_rebuffer_secs: self.buffer.total_rebuffer_secs(),
            throughput_bps: Stats::compute(throughputs()),
            rtt_secs: Stats::compute(rtts()),
            buffer_level_secs: Stats::compute(self.log.iter().map(|r| r.buffer_level_secs)),
            bitrate_switches: self.switch_count,
            goodput_efficiency,
        }
    }

    /// Persist the summary through the sink and return it.
    pub fn finalize(&mut self) -> SessionResult<SessionSummary> {
        let summary = self.summarize();
        self.sink.persist_summary(&summary)?;
        Ok(summary)
    }
}
