use bytes::Bytes;

use crate::config::BackendKind;
use crate::types::CrackError;

/// Result of verifying one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Index into the input batch of the correct password.
    pub match_index: Option<usize>,
    /// Attempts actually performed; never more than the batch length.
    pub attempts: usize,
}

impl BatchOutcome {
    pub fn miss(attempts: usize) -> Self {
        Self { match_index: None, attempts }
    }

    pub fn hit(index: usize, attempts: usize) -> Self {
        Self { match_index: Some(index), attempts }
    }
}

/// Per-thread verifier bound to one target entry.
/// Owns all mutable decode/device state; never shared between workers.
pub trait BatchVerifier: Send {
    fn batch_verify(&mut self, batch: &[String]) -> BatchOutcome;

    /// Release backend resources. Idempotent.
    fn close(&mut self);
}

/// Verification capability. Callers depend on this, never on a concrete backend.
pub trait VerifierBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn new_worker(&self, archive: &Bytes) -> Result<Box<dyn BatchVerifier>, CrackError>;
}
