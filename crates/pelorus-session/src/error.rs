use thiserror::Error;

use crate::controller::SessionState;

/// Session control loop errors.
///
/// Everything here is an invalid-input class failure rejected synchronously
/// at the call boundary. A segment timeout is a recognized outcome, not an
/// error, and never appears in this enum.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("ABR error: {0}")]
    Abr(#[from] pelorus_abr::AbrError),

    #[error("Elapsed time must be non-negative, got {0}")]
    NegativeElapsed(f64),

    #[error("Observation for segment {got}, expected segment {expected}")]
    SegmentIndexMismatch { expected: u64, got: u64 },

    #[error("Observation reports representation `{got}`, expected `{expected}`")]
    RepresentationMismatch { expected: String, got: String },

    #[error("Operation `{op}` is invalid in state {state:?}")]
    InvalidTransition {
        state: SessionState,
        op: &'static str,
    },

    #[error("Metrics sink error: {0}")]
    Sink(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
