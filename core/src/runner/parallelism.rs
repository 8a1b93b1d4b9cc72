use log::debug;

use crate::config::CrackConfig;
use crate::constants::QUEUE_DEPTH_PER_WORKER;

/// Thread and queue sizing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub workers: usize,
    /// Bounded batch queue capacity; the generator blocks beyond it.
    pub queue_capacity: usize,
}

impl ParallelismProfile {
    pub fn from_config(config: &CrackConfig) -> Self {
        let workers = config.workers.max(1);
        let profile = Self { workers, queue_capacity: workers * QUEUE_DEPTH_PER_WORKER };
        debug!("[PROFILE] workers={}, queue_capacity={}", profile.workers, profile.queue_capacity);
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_scales_with_workers() {
        let cfg = CrackConfig { workers: 3, ..Default::default() };
        assert_eq!(ParallelismProfile::from_config(&cfg).queue_capacity, 3 * QUEUE_DEPTH_PER_WORKER);
    }
}
