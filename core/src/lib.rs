//! zipcrack-core
//!
//! Password recovery engine for traditional-cipher ZIP entries.
//! Plain threads and bounded channels; CPU exact-decrypt or wgpu batched check.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

pub mod charset;
pub mod generator;
pub mod archive;
pub mod cipher;
pub mod telemetry;

// Verification and orchestration
pub mod verifier;
pub mod runner;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::archive::ArchiveError;
    pub use crate::charset::{Alphabet, SymbolClass};
    pub use crate::config::{BackendKind, CrackConfig};
    pub use crate::runner::{CancelToken, CrackResult, RunHandle, Runner};
    pub use crate::telemetry::StatsSnapshot;
    pub use crate::types::CrackError;
}
