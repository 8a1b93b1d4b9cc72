//! telemetry/snapshot.rs
//!
//! Immutable view of the attempt counters at one instant.

use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::WorkerCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub per_worker: Vec<u64>,
    pub total: u64,
    pub batches_sent: u64,
    pub batches_taken: u64,
    pub timestamp: SystemTime,
    pub elapsed: Duration,
    pub attempts_per_sec: f64,
}

impl StatsSnapshot {
    pub fn capture(counters: &WorkerCounters, started: Instant) -> Self {
        let per_worker = counters.per_worker();
        let total = per_worker.iter().sum();
        let elapsed = started.elapsed();

        let attempts_per_sec = if elapsed.as_secs_f64() > 0.0 {
            total as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            per_worker,
            total,
            batches_sent: counters.batches_sent(),
            batches_taken: counters.batches_taken(),
            timestamp: SystemTime::now(),
            elapsed,
            attempts_per_sec,
        }
    }

    /// Batches produced but not yet picked up by a worker.
    pub fn queue_depth(&self) -> u64 {
        self.batches_sent.saturating_sub(self.batches_taken)
    }
}
