//! Adaptive Bitrate (ABR) decision policies.
//!
//! This crate provides the protocol-agnostic decision core for adaptive
//! streaming: an ordered representation ladder, a bounded sample window for
//! throughput/RTT smoothing, and two interchangeable decision policies.
//! It works with any delivery transport (chunked HTTP, multiplexed streams)
//! because it only ever sees numbers the transport already measured.
//!
//! ## Features
//!
//! - **Pure decisions**: policies are functions of
//!   `(ladder, current, smoothed throughput)` and mutate nothing
//! - **Threshold policy**: highest representation affordable under a safety
//!   factor, for transports that decide from a smoothed estimate
//! - **Hysteresis policy**: single-rung steps against asymmetric thresholds,
//!   bounding oscillation for transports that decide per segment
//!
//! ## Example
//!
//! ```rust
//! use pelorus_abr::{AbrPolicy, Ladder, Representation};
//!
//! let ladder = Ladder::new(vec![
//!     Representation::new("360p", 500_000),
//!     Representation::new("720p", 1_000_000),
//!     Representation::new("1080p", 2_000_000),
//! ])
//! .unwrap();
//!
//! let current = ladder.lowest().clone();
//! let decision = AbrPolicy::threshold()
//!     .decide(&ladder, &current, 1_600_000.0)
//!     .unwrap();
//! assert!(decision.changed);
//! assert_eq!(decision.target.id, "720p");
//! ```

#![forbid(unsafe_code)]

mod error;
mod ladder;
mod policy;
mod window;

pub use error::{AbrError, AbrResult};
pub use ladder::{Ladder, Representation};
pub use policy::{AbrDecision, AbrPolicy, AbrReason, DEFAULT_SAFETY_FACTOR};
pub use window::SampleWindow;
