//! telemetry/mod.rs
//! Counters collected during a pipeline run and the immutable snapshot
//! returned to the caller.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
