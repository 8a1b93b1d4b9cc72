use std::sync::Arc;

use bytes::Bytes;
use log::{info, warn};

use crate::config::{BackendKind, CrackConfig};
use crate::types::CrackError;
use crate::verifier::types::{BatchVerifier, VerifierBackend};
use crate::verifier::{CpuBackend, GpuBackend};

/// Factory: choose backend from config. GPU init failure falls back to CPU.
pub fn make_backend(config: &CrackConfig) -> Arc<dyn VerifierBackend> {
    match config.backend {
        BackendKind::Cpu => {
            info!("[PIPELINE] using CPU backend");
            Arc::new(CpuBackend)
        }
        BackendKind::Gpu => match GpuBackend::new(&config.kernel_path, config.gpu_batch_capacity) {
            Ok(backend) => {
                info!("[PIPELINE] using GPU backend (capacity {})", backend.capacity());
                Arc::new(backend)
            }
            Err(e) => {
                warn!("[GPU] initialization failed ({e}); falling back to CPU backend");
                Arc::new(CpuBackend)
            }
        },
    }
}

/// Build the first worker synchronously so archive errors surface before
/// any thread starts. A GPU worker that cannot start is replaced by CPU.
pub fn start_first_worker(
    backend: Arc<dyn VerifierBackend>,
    archive: &Bytes,
) -> Result<(Arc<dyn VerifierBackend>, Box<dyn BatchVerifier>), CrackError> {
    match backend.new_worker(archive) {
        Ok(worker) => Ok((backend, worker)),
        Err(e) if backend.kind() == BackendKind::Gpu => {
            warn!("[GPU] worker setup failed ({e}); falling back to CPU backend");
            let cpu: Arc<dyn VerifierBackend> = Arc::new(CpuBackend);
            let worker = cpu.new_worker(archive)?;
            Ok((cpu, worker))
        }
        Err(e) => Err(e),
    }
}
