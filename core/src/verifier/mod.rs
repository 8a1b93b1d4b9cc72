//! Password verification backends.
//!
//! Responsibilities:
//! - Decide whether a candidate unlocks the target entry
//! - Report attempts consumed per batch
//!
//! Non-responsibilities:
//! - Candidate generation
//! - Threading and cancellation

pub mod packing;
pub mod types;
pub mod worker;
pub mod worker_cpu;
pub mod worker_gpu;

pub use packing::{pack_candidates, PackedBatch};
pub use types::{BatchOutcome, BatchVerifier, VerifierBackend};
pub use worker::{make_backend, start_first_worker};
pub use worker_cpu::{CpuBackend, CpuVerifier};
pub use worker_gpu::{GpuBackend, GpuVerifier};
