use std::sync::Arc;

use parking_lot::Mutex;
use pelorus_session::{MetricRecord, MetricsSink, SessionResult, SessionSummary};

#[derive(Default)]
struct Inner {
    records: Vec<MetricRecord>,
    summary: Option<SessionSummary>,
}

/// In-memory [`MetricsSink`] whose contents stay inspectable through a
/// [`MemorySinkHandle`] after the sink has been boxed into a controller.
#[derive(Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Inner>>,
}

/// Read side of a [`MemorySink`].
#[derive(Clone)]
pub struct MemorySinkHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySink {
    pub fn new() -> (Self, MemorySinkHandle) {
        let inner = Arc::new(Mutex::new(Inner::default()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MemorySinkHandle { inner },
        )
    }
}

impl MetricsSink for MemorySink {
    fn append(&mut self, record: &MetricRecord) -> SessionResult<()> {
        self.inner.lock().records.push(record.clone());
        Ok(())
    }

    fn persist_summary(&mut self, summary: &SessionSummary) -> SessionResult<()> {
        self.inner.lock().summary = Some(summary.clone());
        Ok(())
    }
}

impl MemorySinkHandle {
    /// Snapshot of everything appended so far, in append order.
    pub fn records(&self) -> Vec<MetricRecord> {
        self.inner.lock().records.clone()
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.inner.lock().summary.clone()
    }
}
