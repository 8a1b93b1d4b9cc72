mod common;

#[cfg(test)]
mod archive_tests {
    use crate::common::{build_zip, single_entry_zip, FixtureEntry, DOS_TIME};
    use zipcrack_core::archive::{parse_cipher_header, select_target, ArchiveError};
    use zipcrack_core::cipher::ZipCryptoKeys;

    #[test]
    fn cipher_header_matches_raw_bytes() {
        let zip = build_zip(&[FixtureEntry::encrypted("a.txt", b"0123456789", "42")]);
        let layout = &zip.entries[0];

        let target = parse_cipher_header(&zip.bytes).expect("parse");

        assert_eq!(&target.header.bytes[..], &zip.bytes[layout.data_offset..layout.data_offset + 12]);
        assert_eq!(target.header.check, (crc32fast::hash(b"0123456789") >> 24) as u8);
        assert_eq!(target.crc32, layout.crc32);
        assert_eq!(target.data_offset, layout.data_offset);
        assert_eq!(target.data_len, 22);

        let mut header = target.header.bytes;
        ZipCryptoKeys::from_password(b"42").decrypt_in_place(&mut header);
        assert_eq!(header[11], target.header.check);
    }

    #[test]
    fn data_descriptor_uses_mod_time_check_byte() {
        let zip = build_zip(&[FixtureEntry::encrypted("a.txt", b"payload", "pw").with_data_descriptor()]);
        let target = parse_cipher_header(&zip.bytes).expect("parse");
        assert_eq!(target.header.check, (DOS_TIME >> 8) as u8);
        assert_eq!(target.header.check, zip.entries[0].check);
    }

    #[test]
    fn smallest_stored_entry_selected_first_wins_ties() {
        let zip = build_zip(&[
            FixtureEntry::encrypted("big.txt", &[1u8; 64], "pw"),
            FixtureEntry::encrypted("small-1.txt", &[2u8; 8], "pw"),
            FixtureEntry::encrypted("small-2.txt", &[3u8; 8], "pw"),
        ]);
        let target = parse_cipher_header(&zip.bytes).expect("parse");
        assert_eq!(target.data_offset, zip.entries[1].data_offset);
        assert_eq!(target.uncompressed_size, 8);
    }

    #[test]
    fn deflated_encrypted_entries_are_not_gpu_targets() {
        let zip = build_zip(&[FixtureEntry::encrypted("c.bin", b"compressed?", "pw").with_method(8)]);
        assert!(matches!(parse_cipher_header(&zip.bytes), Err(ArchiveError::NoStoredZipCryptoEntry)));
    }

    #[test]
    fn unencrypted_archive_has_no_gpu_target() {
        let zip = build_zip(&[FixtureEntry::plain("p.txt", b"open")]);
        assert!(matches!(parse_cipher_header(&zip.bytes), Err(ArchiveError::NoStoredZipCryptoEntry)));
    }

    #[test]
    fn local_offset_out_of_range_is_rejected() {
        let mut zip = build_zip(&[FixtureEntry::encrypted("a.txt", b"data", "pw")]);
        let at = zip.entries[0].central_offset + 42;
        zip.bytes[at..at + 4].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
        assert!(matches!(parse_cipher_header(&zip.bytes), Err(ArchiveError::OffsetOutOfRange { .. })));
    }

    #[test]
    fn bad_local_signature_is_rejected() {
        let mut zip = build_zip(&[FixtureEntry::encrypted("a.txt", b"data", "pw")]);
        zip.bytes[0] = 0;
        assert!(matches!(
            parse_cipher_header(&zip.bytes),
            Err(ArchiveError::BadSignature { what: "local header", offset: 0, .. })
        ));
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = single_entry_zip(b"data", "pw");
        assert!(parse_cipher_header(&bytes[..bytes.len() - 1]).is_err());
        assert!(matches!(parse_cipher_header(&bytes[..10]), Err(ArchiveError::BufferTooSmall { .. })));
    }

    // ---- Codec-backed selection ----

    #[test]
    fn select_target_skips_directories_and_plain_files() {
        let zip = build_zip(&[
            FixtureEntry::directory("dir/"),
            FixtureEntry::plain("tiny.txt", b"x"),
            FixtureEntry::encrypted("large.txt", &[0u8; 40], "pw"),
            FixtureEntry::encrypted("medium.txt", &[0u8; 20], "pw"),
        ]);
        let target = select_target(&zip.bytes).expect("select");
        assert_eq!(target.index, 3);
        assert_eq!(target.name, "medium.txt");
        assert_eq!(target.size, 20);
    }

    #[test]
    fn select_target_is_deterministic() {
        let zip = build_zip(&[
            FixtureEntry::encrypted("one.txt", &[9u8; 5], "pw"),
            FixtureEntry::encrypted("two.txt", &[9u8; 5], "pw"),
        ]);
        let first = select_target(&zip.bytes).expect("select");
        for _ in 0..10 {
            assert_eq!(select_target(&zip.bytes).expect("select"), first);
        }
        assert_eq!(first.index, 0);
    }

    #[test]
    fn select_target_errors() {
        assert!(matches!(select_target(&[]), Err(ArchiveError::EmptyInput)));
        assert!(matches!(select_target(b"definitely not a zip file"), Err(ArchiveError::Malformed(_))));
        assert!(matches!(select_target(&build_zip(&[]).bytes), Err(ArchiveError::NoEntries)));

        let plain = build_zip(&[FixtureEntry::plain("p.txt", b"open")]);
        assert!(matches!(select_target(&plain.bytes), Err(ArchiveError::NoEncryptedEntries)));
    }
}
