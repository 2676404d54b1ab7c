//! Shared fixtures for pelorus integration tests.

#![forbid(unsafe_code)]

mod memory_sink;
mod script;

pub use memory_sink::{MemorySink, MemorySinkHandle};
pub use script::{ladder_3_rung, partial, segment_done, ScriptedTrace};
