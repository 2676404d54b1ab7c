use chrono::Utc;
use pelorus_abr::{Ladder, Representation};
use pelorus_session::ProgressEvent;

/// The ladder most integration tests run against.
pub fn ladder_3_rung() -> Ladder {
    Ladder::new(vec![
        Representation::new("360p", 500_000),
        Representation::new("720p", 1_000_000),
        Representation::new("1080p", 2_000_000),
    ])
    .expect("static ladder is non-empty")
}

/// Final observation for `segment_index`, stamped now.
pub fn segment_done(segment_index: u64, representation_id: &str, bytes: u64, elapsed_secs: f64) -> ProgressEvent {
    ProgressEvent::completed(segment_index, representation_id, bytes, elapsed_secs, Utc::now())
}

/// Interim chunk observation for `segment_index`, stamped now.
pub fn partial(segment_index: u64, representation_id: &str, bytes: u64, elapsed_secs: f64) -> ProgressEvent {
    ProgressEvent::partial(segment_index, representation_id, bytes, elapsed_secs, Utc::now())
}

/// A fixed sequence of observations replayed against one session.
///
/// Each step is `(bytes, elapsed_secs)` for one completed segment; replay
/// order is injection order, which lifecycle tests assert against the
/// persisted metric log.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTrace {
    steps: Vec<(u64, f64)>,
}

impl ScriptedTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, bytes: u64, elapsed_secs: f64) -> Self {
        self.steps.push((bytes, elapsed_secs));
        self
    }

    /// Repeat the same observation `count` times.
    pub fn then_repeated(mut self, bytes: u64, elapsed_secs: f64, count: usize) -> Self {
        self.steps.extend(std::iter::repeat((bytes, elapsed_secs)).take(count));
        self
    }

    pub fn steps(&self) -> &[(u64, f64)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
