use std::io::{self, Cursor};

use bytes::Bytes;
use log::debug;
use zip::ZipArchive;

use crate::archive::{select_target, TargetEntry};
use crate::config::BackendKind;
use crate::types::{AttemptError, CrackError};
use crate::verifier::types::{BatchOutcome, BatchVerifier, VerifierBackend};

/// Exact-decrypt backend over the general-purpose ZIP codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuBackend;

impl VerifierBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn new_worker(&self, archive: &Bytes) -> Result<Box<dyn BatchVerifier>, CrackError> {
        Ok(Box::new(CpuVerifier::new(archive.clone())?))
    }
}

/// Each attempt opens a fresh reader over the shared bytes, so no decoder
/// state survives between candidates.
pub struct CpuVerifier {
    archive: Bytes,
    target: TargetEntry,
}

impl CpuVerifier {
    pub fn new(archive: Bytes) -> Result<Self, CrackError> {
        let target = select_target(&archive)?;
        debug!("[CPU] target entry #{} {:?} ({} bytes)", target.index, target.name, target.size);
        Ok(Self { archive, target })
    }

    /// Open and fully drain the target entry. Integrity checks (CRC, MAC)
    /// only complete at end of stream.
    fn attempt(&self, password: &str) -> Result<(), AttemptError> {
        let mut archive = ZipArchive::new(Cursor::new(&self.archive[..]))?;
        let mut file = archive.by_index_decrypt(self.target.index, password.as_bytes())?;
        io::copy(&mut file, &mut io::sink())?;
        Ok(())
    }

    pub fn try_password(&self, password: &str) -> bool {
        self.attempt(password).is_ok()
    }
}

impl BatchVerifier for CpuVerifier {
    fn batch_verify(&mut self, batch: &[String]) -> BatchOutcome {
        match batch.iter().position(|pw| self.try_password(pw)) {
            Some(i) => BatchOutcome::hit(i, i + 1),
            None => BatchOutcome::miss(batch.len()),
        }
    }

    fn close(&mut self) {}
}
