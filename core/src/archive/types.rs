//! archive/types.rs
//! Typed views over ZIP metadata needed to pick and attack a target entry.

use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::zip_format::CIPHER_HEADER_LEN;

bitflags::bitflags! {
    /// General-purpose bit flags (APPNOTE 4.4.4). Only the bits we act on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GeneralPurposeFlags: u16 {
        /// Entry is encrypted.
        const ENCRYPTED = 0x0001;

        /// Sizes and CRC follow the data; check byte comes from the mod time.
        const DATA_DESCRIPTOR = 0x0008;

        /// Strong encryption; never the traditional cipher.
        const STRONG_ENCRYPTION = 0x0040;
    }
}

/// Compression method ids the parser can attack. Anything else is skipped.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum CompressionMethod {
    Stored = 0,
}

/// One central-directory record, reduced to the fields the parser consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralEntry {
    pub flags: GeneralPurposeFlags,
    pub method: u16,
    pub mod_time: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl CentralEntry {
    /// Traditional-cipher entry stored without compression.
    pub fn is_stored_zipcrypto(&self) -> bool {
        self.flags.contains(GeneralPurposeFlags::ENCRYPTED)
            && !self.flags.contains(GeneralPurposeFlags::STRONG_ENCRYPTION)
            && matches!(CompressionMethod::try_from(self.method), Ok(CompressionMethod::Stored))
    }

    /// Expected last plaintext byte of the cipher header.
    pub fn check_byte(&self) -> u8 {
        if self.flags.contains(GeneralPurposeFlags::DATA_DESCRIPTOR) {
            (self.mod_time >> 8) as u8
        } else {
            (self.crc32 >> 24) as u8
        }
    }
}

/// Encrypted 12-byte header plus the byte its decryption must end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherHeader {
    pub bytes: [u8; CIPHER_HEADER_LEN],
    pub check: u8,
}

impl CipherHeader {
    /// Header packed as three little-endian words for device upload.
    pub fn words(&self) -> [u32; 3] {
        let mut out = [0u32; 3];
        for (i, chunk) in self.bytes.chunks_exact(4).enumerate() {
            out[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        out
    }
}

/// Everything the GPU path needs about its target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCryptoTarget {
    pub header: CipherHeader,
    pub crc32: u32,
    pub mod_time: u16,
    pub flags: GeneralPurposeFlags,
    pub uncompressed_size: u32,
    /// Offset of the cipher header, i.e. the first byte of entry data.
    pub data_offset: usize,
    /// Length of entry data including the cipher header.
    pub data_len: usize,
}

impl ZipCryptoTarget {
    /// Encrypted entry data (`header || payload`) within the archive.
    pub fn encrypted_data<'a>(&self, archive: &'a [u8]) -> &'a [u8] {
        let end = self.data_offset.saturating_add(self.data_len).min(archive.len());
        archive.get(self.data_offset..end).unwrap_or(&[])
    }
}

/// Entry chosen through the general-purpose codec (CPU path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub index: usize,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive is empty")]
    EmptyInput,

    #[error("archive rejected by codec: {0}")]
    Malformed(#[from] zip::result::ZipError),

    #[error("archive has no entries")]
    NoEntries,

    #[error("archive has no encrypted files")]
    NoEncryptedEntries,

    #[error("buffer too small: have {have} bytes, need {need}")]
    BufferTooSmall { have: usize, need: usize },

    #[error("end of central directory not found")]
    EocdNotFound,

    #[error("{what} offset {offset} out of range (len {len})")]
    OffsetOutOfRange { what: &'static str, offset: usize, len: usize },

    #[error("bad {what} signature at {offset}: {found:#010x}")]
    BadSignature { what: &'static str, offset: usize, found: u32 },

    #[error("no stored traditional-cipher entry")]
    NoStoredZipCryptoEntry,

    #[error("entry data too short for cipher header at {offset}")]
    TruncatedCipherHeader { offset: usize },
}
