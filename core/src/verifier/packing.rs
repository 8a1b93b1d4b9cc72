//! verifier/packing.rs
//! Host-side serialization of candidates into device buffers.
//!
//! Layout:
//! - `lengths[i]`: byte length of candidate `i`, or `OVERLONG_MARKER` when it
//!   does not fit a slot (the kernel writes 0 for such slots)
//! - `words[i * STRIDE_WORDS ..]`: candidate bytes, little-endian within each
//!   word, zero padded to the slot end

use crate::constants::gpu::{CANDIDATE_STRIDE_BYTES, CANDIDATE_STRIDE_WORDS, OVERLONG_MARKER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBatch {
    pub lengths: Vec<u32>,
    pub words: Vec<u32>,
}

impl PackedBatch {
    /// Number of slots packed (the truncated batch length).
    pub fn count(&self) -> usize {
        self.lengths.len()
    }
}

/// Pack at most `capacity` candidates; the rest of the batch is dropped.
pub fn pack_candidates(batch: &[String], capacity: usize) -> PackedBatch {
    let count = batch.len().min(capacity);
    let mut lengths = Vec::with_capacity(count);
    let mut words = vec![0u32; count * CANDIDATE_STRIDE_WORDS];

    for (slot, candidate) in batch.iter().take(count).enumerate() {
        let bytes = candidate.as_bytes();
        if bytes.len() > CANDIDATE_STRIDE_BYTES {
            lengths.push(OVERLONG_MARKER);
            continue;
        }
        lengths.push(bytes.len() as u32);

        let base = slot * CANDIDATE_STRIDE_WORDS;
        for (i, &b) in bytes.iter().enumerate() {
            words[base + i / 4] |= (b as u32) << ((i % 4) * 8);
        }
    }

    PackedBatch { lengths, words }
}
