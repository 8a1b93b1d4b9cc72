//! archive/target.rs
//! Target selection through the general-purpose codec (CPU path).

use std::io::Cursor;

use zip::ZipArchive;

use crate::archive::types::{ArchiveError, TargetEntry};

/// Smallest encrypted regular file; first encountered wins ties.
pub fn select_target(bytes: &[u8]) -> Result<TargetEntry, ArchiveError> {
    if bytes.is_empty() {
        return Err(ArchiveError::EmptyInput);
    }
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() == 0 {
        return Err(ArchiveError::NoEntries);
    }

    let mut best: Option<TargetEntry> = None;
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        if file.is_dir() || !file.encrypted() {
            continue;
        }
        let size = file.size();
        if best.as_ref().map_or(true, |b| size < b.size) {
            best = Some(TargetEntry { index, name: file.name().to_string(), size });
        }
    }
    best.ok_or(ArchiveError::NoEncryptedEntries)
}
