//! ZIP metadata access.
//!
//! Two independent views over the same bytes:
//! - `select_target`: codec-backed entry choice for the CPU path
//! - `parse_cipher_header`: hand-rolled walker for the GPU path

pub mod decode;
pub mod target;
pub mod types;

pub use decode::parse_cipher_header;
pub use target::select_target;
pub use types::{
    ArchiveError, CentralEntry, CipherHeader, CompressionMethod, GeneralPurposeFlags, TargetEntry, ZipCryptoTarget,
};
