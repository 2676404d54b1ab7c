use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[cfg(test)]
use mockall::automock;

use crate::{
    error::SessionResult,
    record::{MetricRecord, SessionSummary},
};

/// Append-only destination for the session's metric log.
///
/// `append` must be durable before it returns: a crash mid-session loses at
/// most the in-flight record, never prior ones.
#[cfg_attr(test, automock)]
pub trait MetricsSink: Send {
    fn append(&mut self, record: &MetricRecord) -> SessionResult<()>;

    fn persist_summary(&mut self, summary: &SessionSummary) -> SessionResult<()>;
}

/// Line-delimited JSON metrics log on disk, one object per record, flushed
/// per append. The summary goes to a sibling file at session end.
pub struct JsonlSink {
    writer: BufWriter<File>,
    metrics_path: PathBuf,
    summary_path: PathBuf,
}

impl JsonlSink {
    /// Create (or truncate) the metrics log at `metrics_path`; the summary
    /// will be written to `summary_path` when the session finishes.
    pub fn create(
        metrics_path: impl Into<PathBuf>,
        summary_path: impl Into<PathBuf>,
    ) -> SessionResult<Self> {
        let metrics_path = metrics_path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&metrics_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            metrics_path,
            summary_path: summary_path.into(),
        })
    }

    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }
}

impl MetricsSink for JsonlSink {
    fn append(&mut self, record: &MetricRecord) -> SessionResult<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        // flush per record: durability over throughput for a metrics log
        self.writer.flush()?;
        Ok(())
    }

    fn persist_summary(&mut self, summary: &SessionSummary) -> SessionResult<()> {
        let json = serde_json::to_vec_pretty(summary).map_err(std::io::Error::from)?;
        std::fs::write(&self.summary_path, json)?;
        Ok(())
    }
}

/// Sink that discards everything. For adapters that only consume the event
/// stream, and for examples.
pub struct NullSink;

impl MetricsSink for NullSink {
    fn append(&mut self, _record: &MetricRecord) -> SessionResult<()> {
        Ok(())
    }

    fn persist_summary(&mut self, _summary: &SessionSummary) -> SessionResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;

    fn record(segment_index: u64) -> MetricRecord {
        MetricRecord {
            timestamp: Utc::now(),
            segment_index,
            representation_id: "360p".into(),
            bitrate_bps: 500_000,
            bytes: 250_000,
            elapsed_secs: 1.0,
            throughput_bps: 2_000_000.0,
            smoothed_throughput_bps: 2_000_000.0,
            rtt_secs: 1.0,
            buffer_level_secs: 2.0,
            rebuffer_count: 1,
            total_rebuffer_secs: 0.0,
            playback_position_secs: 0.0,
            is_rebuffering: false,
            bitrate_switch: false,
            goodput_bps: 500_000.0,
            loss_estimate: 0.0,
            is_complete: true,
        }
    }

    #[test]
    fn appends_one_line_per_record_in_order() {
        let dir = tempdir().unwrap();
        let metrics = dir.path().join("metrics.jsonl");
        let summary = dir.path().join("summary.json");
        let mut sink = JsonlSink::create(&metrics, &summary).unwrap();

        for i in 0..3 {
            sink.append(&record(i)).unwrap();
        }

        let contents = std::fs::read_to_string(&metrics).unwrap();
        let parsed: Vec<MetricRecord> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 3);
        let indices: Vec<u64> = parsed.iter().map(|r| r.segment_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn records_are_readable_before_the_sink_is_dropped() {
        let dir = tempdir().unwrap();
        let metrics = dir.path().join("metrics.jsonl");
        let mut sink = JsonlSink::create(&metrics, dir.path().join("summary.json")).unwrap();

        sink.append(&record(0)).unwrap();

        // the append flushed; a concurrent reader (or a crash) sees the record
        let contents = std::fs::read_to_string(&metrics).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn summary_is_persisted_as_json() {
        let dir = tempdir().unwrap();
        let summary_path = dir.path().join("summary.json");
        let mut sink =
            JsonlSink::create(dir.path().join("metrics.jsonl"), &summary_path).unwrap();

        let summary = SessionSummary {
            records: 4,
            completed_segments: 3,
            ..SessionSummary::default()
        };
        sink.persist_summary(&summary).unwrap();

        let back: SessionSummary =
            serde_json::from_slice(&std::fs::read(&summary_path).unwrap()).unwrap();
        assert_eq!(back, summary);
    }
}
