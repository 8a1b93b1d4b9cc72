//! generator/mod.rs
//! Random candidate sampling over an alphabet and a length range.
//!
//! This samples, it does not enumerate: candidates may repeat within and
//! across batches. The only state carried between batches is the RNG.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::charset::Alphabet;

/// One generation step worth of candidates, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: u64,
    pub candidates: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub struct CandidateGenerator {
    symbols: Vec<char>,
    min_len: usize,
    max_len: usize,
    batch_size: usize,
    rng: StdRng,
    next_index: u64,
}

impl CandidateGenerator {
    /// `max_len < min_len` collapses to `min_len`; `batch_size` 0 becomes 1.
    pub fn new(alphabet: &Alphabet, min_len: usize, max_len: usize, batch_size: usize, seed: u64) -> Self {
        Self {
            symbols: alphabet.symbols().to_vec(),
            min_len,
            max_len: max_len.max(min_len),
            batch_size: batch_size.max(1),
            rng: StdRng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    /// Seed from wall-clock entropy mixed with run parameters.
    pub fn run_seed(workers: usize, alphabet_len: usize) -> u64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        nanos ^ workers as u64 ^ alphabet_len as u64
    }

    fn candidate(&mut self) -> String {
        // Empty alphabet degenerates to empty candidates.
        if self.symbols.is_empty() {
            return String::new();
        }
        let len = self.rng.gen_range(self.min_len..=self.max_len);
        (0..len)
            .map(|_| self.symbols[self.rng.gen_range(0..self.symbols.len())])
            .collect()
    }

    pub fn next_batch(&mut self) -> Batch {
        let candidates = (0..self.batch_size).map(|_| self.candidate()).collect();
        let index = self.next_index;
        self.next_index += 1;
        Batch { index, candidates }
    }
}

impl Iterator for CandidateGenerator {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        Some(self.next_batch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_has_configured_size_and_bounds() {
        let alphabet = Alphabet::from("xyz");
        let mut generator = CandidateGenerator::new(&alphabet, 2, 4, 100, 7);
        let batch = generator.next_batch();
        assert_eq!(batch.len(), 100);
        for c in &batch.candidates {
            let n = c.chars().count();
            assert!((2..=4).contains(&n), "bad length {n}");
            assert!(c.chars().all(|ch| alphabet.contains(ch)));
        }
    }

    #[test]
    fn batch_indices_increase() {
        let mut generator = CandidateGenerator::new(&Alphabet::from("ab"), 1, 1, 4, 1);
        let indices: Vec<u64> = generator.by_ref().take(3).map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn same_seed_same_stream() {
        let alphabet = Alphabet::from("0123456789");
        let mut a = CandidateGenerator::new(&alphabet, 1, 6, 32, 99);
        let mut b = CandidateGenerator::new(&alphabet, 1, 6, 32, 99);
        assert_eq!(a.next_batch(), b.next_batch());
    }

    #[test]
    fn empty_alphabet_yields_empty_candidates() {
        let mut generator = CandidateGenerator::new(&Alphabet::from(""), 1, 3, 5, 0);
        let batch = generator.next_batch();
        assert_eq!(batch.len(), 5);
        assert!(batch.candidates.iter().all(String::is_empty));
    }

    #[test]
    fn zero_batch_size_becomes_one() {
        let mut generator = CandidateGenerator::new(&Alphabet::from("a"), 1, 1, 0, 0);
        assert_eq!(generator.next_batch().candidates, vec!["a".to_string()]);
    }
}
