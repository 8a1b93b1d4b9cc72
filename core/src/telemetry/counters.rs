//! telemetry/counters.rs
//! Lock-free attempt counters shared between workers and the sampler.
//!
//! Summary: one cache-padded slot per worker, written only by its owner.
//! Batch queue counters let callers observe backpressure.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

#[derive(Debug)]
pub struct WorkerCounters {
    per_worker: Vec<CachePadded<AtomicU64>>,
    batches_sent: CachePadded<AtomicU64>,
    batches_taken: CachePadded<AtomicU64>,
}

impl WorkerCounters {
    pub fn new(workers: usize) -> Self {
        Self {
            per_worker: (0..workers).map(|_| CachePadded::new(AtomicU64::new(0))).collect(),
            batches_sent: CachePadded::new(AtomicU64::new(0)),
            batches_taken: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Record attempts consumed by worker `id`. Out-of-range ids are ignored.
    #[inline]
    pub fn add_attempts(&self, id: usize, attempts: u64) {
        if let Some(slot) = self.per_worker.get(id) {
            slot.fetch_add(attempts, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_sent(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_taken(&self) {
        self.batches_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn per_worker(&self) -> Vec<u64> {
        self.per_worker.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    pub fn total(&self) -> u64 {
        self.per_worker.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn batches_taken(&self) -> u64 {
        self.batches_taken.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_slots() {
        let c = WorkerCounters::new(3);
        c.add_attempts(0, 5);
        c.add_attempts(2, 7);
        c.add_attempts(9, 100);
        assert_eq!(c.per_worker(), vec![5, 0, 7]);
        assert_eq!(c.total(), 12);
    }
}
