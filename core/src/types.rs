use std::io;
use thiserror::Error;

use crate::archive::ArchiveError;

/// Unified engine error covering configuration, archive, backend and resource failures.
/// - Ergonomic `From<T>` impls enable `?` across layers.
/// - Attempt-level failures never surface here; they fold into "no match".
#[derive(Debug, Error)]
pub enum CrackError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("backend init error: {0}")]
    BackendInit(#[from] BackendInitError),

    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Pipeline wiring failure (thread spawn, channel setup).
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// Invalid run parameters that cannot be normalized to a safe default.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("alphabet is empty")]
    EmptyAlphabet,

    #[error("cannot read config file: {0}")]
    Io(#[from] io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Requested verification backend could not start. Recovered by CPU fallback.
#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(String),

    #[error("device request failed: {0}")]
    Device(String),

    #[error("cannot load compute kernel {path}: {source}")]
    KernelMissing { path: String, source: io::Error },

    #[error("compute kernel rejected: {0}")]
    KernelInvalid(String),
}

/// Per-worker backend resource allocation failure.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("device buffer {label} of {size} bytes exceeds limit {limit}")]
    BufferTooLarge { label: &'static str, size: u64, limit: u64 },

    #[error("device batch capacity is zero")]
    ZeroCapacity,

    #[error("device operation failed: {0}")]
    Device(String),
}

/// Single-candidate verification failure: wrong password or decode failure.
/// Never propagated past the worker.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("codec rejected attempt: {0}")]
    Codec(#[from] zip::result::ZipError),

    #[error("stream failed during drain: {0}")]
    Io(#[from] io::Error),
}
