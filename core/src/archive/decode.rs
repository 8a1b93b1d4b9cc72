//! archive/decode.rs
//! Codec-free ZIP walker feeding the GPU path.
//!
//! Design notes:
//! - Input is untrusted: every read is bounds-checked before slicing.
//! - Only EOCD, central directory and the selected local header are touched.
//! - Selection mirrors `select_target` but restricted to stored traditional-cipher entries.

use byteorder::{ByteOrder, LittleEndian};

use crate::archive::types::{ArchiveError, CentralEntry, CipherHeader, GeneralPurposeFlags, ZipCryptoTarget};
use crate::constants::zip_format::{
    CENTRAL_HEADER_LEN, CENTRAL_SIGNATURE, CIPHER_HEADER_LEN, EOCD_LEN, EOCD_SIGNATURE, LOCAL_HEADER_LEN,
    LOCAL_SIGNATURE,
};

/// Bounds-checked view of `len` bytes at `offset`.
#[inline]
fn field<'a>(buf: &'a [u8], offset: usize, len: usize, what: &'static str) -> Result<&'a [u8], ArchiveError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(ArchiveError::OffsetOutOfRange { what, offset, len: buf.len() })
}

/// Offset of the end-of-central-directory record, scanning backward.
pub fn find_eocd(buf: &[u8]) -> Result<usize, ArchiveError> {
    if buf.len() < EOCD_LEN {
        return Err(ArchiveError::BufferTooSmall { have: buf.len(), need: EOCD_LEN });
    }
    (0..=buf.len() - EOCD_LEN)
        .rev()
        .find(|&i| LittleEndian::read_u32(&buf[i..i + 4]) == EOCD_SIGNATURE)
        .ok_or(ArchiveError::EocdNotFound)
}

/// `(entry_count, central_directory_offset)` from the EOCD record.
pub fn read_eocd(buf: &[u8], eocd: usize) -> Result<(u16, usize), ArchiveError> {
    let rec = field(buf, eocd, EOCD_LEN, "eocd")?;
    let entries = LittleEndian::read_u16(&rec[10..12]); // total entries
    let cd_offset = LittleEndian::read_u32(&rec[16..20]) as usize;
    if cd_offset >= buf.len() {
        return Err(ArchiveError::OffsetOutOfRange { what: "central directory", offset: cd_offset, len: buf.len() });
    }
    Ok((entries, cd_offset))
}

/// Decode the central record at `offset`; returns it with the next record's offset.
pub fn read_central_entry(buf: &[u8], offset: usize) -> Result<(CentralEntry, usize), ArchiveError> {
    let rec = field(buf, offset, CENTRAL_HEADER_LEN, "central record")?;

    let sig = LittleEndian::read_u32(&rec[0..4]);
    if sig != CENTRAL_SIGNATURE {
        return Err(ArchiveError::BadSignature { what: "central directory", offset, found: sig });
    }

    let entry = CentralEntry {
        flags: GeneralPurposeFlags::from_bits_retain(LittleEndian::read_u16(&rec[8..10])),
        method: LittleEndian::read_u16(&rec[10..12]),
        mod_time: LittleEndian::read_u16(&rec[12..14]),
        crc32: LittleEndian::read_u32(&rec[16..20]),
        compressed_size: LittleEndian::read_u32(&rec[20..24]),
        uncompressed_size: LittleEndian::read_u32(&rec[24..28]),
        local_header_offset: LittleEndian::read_u32(&rec[42..46]),
    };

    let name_len = LittleEndian::read_u16(&rec[28..30]) as usize;
    let extra_len = LittleEndian::read_u16(&rec[30..32]) as usize;
    let comment_len = LittleEndian::read_u16(&rec[32..34]) as usize;
    let next = offset + CENTRAL_HEADER_LEN + name_len + extra_len + comment_len;

    Ok((entry, next))
}

/// Offset of entry data (the cipher header) behind the local header at `offset`.
pub fn local_data_offset(buf: &[u8], offset: usize) -> Result<usize, ArchiveError> {
    let rec = field(buf, offset, LOCAL_HEADER_LEN, "local header")?;

    let sig = LittleEndian::read_u32(&rec[0..4]);
    if sig != LOCAL_SIGNATURE {
        return Err(ArchiveError::BadSignature { what: "local header", offset, found: sig });
    }

    let name_len = LittleEndian::read_u16(&rec[26..28]) as usize;
    let extra_len = LittleEndian::read_u16(&rec[28..30]) as usize;
    Ok(offset + LOCAL_HEADER_LEN + name_len + extra_len)
}

/// Extract the cipher header and check byte of the smallest stored
/// traditional-cipher entry. First encountered wins ties.
pub fn parse_cipher_header(buf: &[u8]) -> Result<ZipCryptoTarget, ArchiveError> {
    let eocd = find_eocd(buf)?;
    let (count, mut offset) = read_eocd(buf, eocd)?;

    let mut best: Option<CentralEntry> = None;
    for _ in 0..count {
        let (entry, next) = read_central_entry(buf, offset)?;
        offset = next;

        if !entry.is_stored_zipcrypto() {
            continue;
        }
        if best.as_ref().map_or(true, |b| entry.uncompressed_size < b.uncompressed_size) {
            best = Some(entry);
        }
    }
    let entry = best.ok_or(ArchiveError::NoStoredZipCryptoEntry)?;

    let data_offset = local_data_offset(buf, entry.local_header_offset as usize)?;
    let raw = field(buf, data_offset, CIPHER_HEADER_LEN, "cipher header")
        .map_err(|_| ArchiveError::TruncatedCipherHeader { offset: data_offset })?;

    let mut bytes = [0u8; CIPHER_HEADER_LEN];
    bytes.copy_from_slice(raw);

    // Stored data = cipher header + plaintext length; never shorter than the header.
    let data_len = (entry.compressed_size as usize).max(CIPHER_HEADER_LEN);
    field(buf, data_offset, data_len, "entry data")?;

    Ok(ZipCryptoTarget {
        header: CipherHeader { bytes, check: entry.check_byte() },
        crc32: entry.crc32,
        mod_time: entry.mod_time,
        flags: entry.flags,
        uncompressed_size: entry.uncompressed_size,
        data_offset,
        data_len,
    })
}
