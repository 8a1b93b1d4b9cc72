//! telemetry/mod.rs
//! Attempt counters and the snapshots sampled from them.

pub mod counters;
pub mod snapshot;

pub use counters::WorkerCounters;
pub use snapshot::StatsSnapshot;
