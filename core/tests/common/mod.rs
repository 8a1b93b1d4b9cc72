//! Byte-level ZIP fixture writer for traditional-cipher entries.
//!
//! Every offset is recorded so tests can check parser output against
//! values computed independently of the parser.
#![allow(dead_code)]

use zipcrack_core::cipher::ZipCryptoKeys;

pub const DOS_TIME: u16 = 12 << 11; // 12:00:00
pub const DOS_DATE: u16 = (40 << 9) | (1 << 5) | 1; // 2020-01-01

pub struct FixtureEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub password: Option<String>,
    pub data_descriptor: bool,
    /// Method id written to the headers; data is never actually compressed.
    pub method: u16,
}

impl FixtureEntry {
    pub fn encrypted(name: &str, data: &[u8], password: &str) -> Self {
        Self {
            name: name.into(),
            data: data.to_vec(),
            password: Some(password.into()),
            data_descriptor: false,
            method: 0,
        }
    }

    pub fn plain(name: &str, data: &[u8]) -> Self {
        Self { name: name.into(), data: data.to_vec(), password: None, data_descriptor: false, method: 0 }
    }

    pub fn directory(name: &str) -> Self {
        Self::plain(name, &[])
    }

    pub fn with_data_descriptor(mut self) -> Self {
        self.data_descriptor = true;
        self
    }

    pub fn with_method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EntryLayout {
    pub local_offset: usize,
    pub data_offset: usize,
    pub data_len: usize,
    pub crc32: u32,
    pub check: u8,
    pub central_offset: usize,
}

pub struct BuiltZip {
    pub bytes: Vec<u8>,
    pub entries: Vec<EntryLayout>,
    pub central_directory_offset: usize,
}

fn put16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn build_zip(entries: &[FixtureEntry]) -> BuiltZip {
    let mut out = Vec::new();
    let mut layouts = Vec::new();

    // ---- Local headers + data ----
    for (n, e) in entries.iter().enumerate() {
        let crc = crc32fast::hash(&e.data);
        let mut flags = 0u16;
        let mut body = e.data.clone();
        let mut check = 0u8;

        if let Some(pw) = &e.password {
            flags |= 0x0001;
            if e.data_descriptor {
                flags |= 0x0008;
            }
            check = if e.data_descriptor { (DOS_TIME >> 8) as u8 } else { (crc >> 24) as u8 };

            let mut header = [0u8; 12];
            for (i, b) in header.iter_mut().enumerate().take(11) {
                *b = (n as u8).wrapping_mul(31).wrapping_add(i as u8 * 17 + 5);
            }
            header[11] = check;

            let mut plain = header.to_vec();
            plain.extend_from_slice(&e.data);
            ZipCryptoKeys::from_password(pw.as_bytes()).encrypt_in_place(&mut plain);
            body = plain;
        }

        let local_offset = out.len();
        let (local_crc, local_size, local_usize) = if e.data_descriptor {
            (0, 0, 0)
        } else {
            (crc, body.len() as u32, e.data.len() as u32)
        };

        put32(&mut out, 0x0403_4b50);
        put16(&mut out, 20); // version needed
        put16(&mut out, flags);
        put16(&mut out, e.method);
        put16(&mut out, DOS_TIME);
        put16(&mut out, DOS_DATE);
        put32(&mut out, local_crc);
        put32(&mut out, local_size);
        put32(&mut out, local_usize);
        put16(&mut out, e.name.len() as u16);
        put16(&mut out, 0); // extra len
        out.extend_from_slice(e.name.as_bytes());

        let data_offset = out.len();
        out.extend_from_slice(&body);

        if e.data_descriptor {
            put32(&mut out, 0x0807_4b50);
            put32(&mut out, crc);
            put32(&mut out, body.len() as u32);
            put32(&mut out, e.data.len() as u32);
        }

        layouts.push(EntryLayout {
            local_offset,
            data_offset,
            data_len: body.len(),
            crc32: crc,
            check,
            central_offset: 0,
        });
    }

    // ---- Central directory ----
    let cd_offset = out.len();
    for (e, layout) in entries.iter().zip(layouts.iter_mut()) {
        layout.central_offset = out.len();
        let mut flags = 0u16;
        if e.password.is_some() {
            flags |= 0x0001;
            if e.data_descriptor {
                flags |= 0x0008;
            }
        }
        let external_attr: u32 = if e.name.ends_with('/') { 0x10 } else { 0 };

        put32(&mut out, 0x0201_4b50);
        put16(&mut out, 20); // version made by
        put16(&mut out, 20); // version needed
        put16(&mut out, flags);
        put16(&mut out, e.method);
        put16(&mut out, DOS_TIME);
        put16(&mut out, DOS_DATE);
        put32(&mut out, layout.crc32);
        put32(&mut out, layout.data_len as u32);
        put32(&mut out, e.data.len() as u32);
        put16(&mut out, e.name.len() as u16);
        put16(&mut out, 0); // extra len
        put16(&mut out, 0); // comment len
        put16(&mut out, 0); // disk start
        put16(&mut out, 0); // internal attr
        put32(&mut out, external_attr);
        put32(&mut out, layout.local_offset as u32);
        out.extend_from_slice(e.name.as_bytes());
    }
    let cd_size = out.len() - cd_offset;

    // ---- EOCD ----
    put32(&mut out, 0x0605_4b50);
    put16(&mut out, 0);
    put16(&mut out, 0);
    put16(&mut out, entries.len() as u16);
    put16(&mut out, entries.len() as u16);
    put32(&mut out, cd_size as u32);
    put32(&mut out, cd_offset as u32);
    put16(&mut out, 0);

    BuiltZip { bytes: out, entries: layouts, central_directory_offset: cd_offset }
}

/// Single encrypted stored entry.
pub fn single_entry_zip(data: &[u8], password: &str) -> Vec<u8> {
    build_zip(&[FixtureEntry::encrypted("secret.txt", data, password)]).bytes
}

/// Every string of length `len` over `alphabet`, in lexicographic order.
pub fn all_strings(alphabet: &[char], len: usize) -> Vec<String> {
    let mut out = vec![String::new()];
    for _ in 0..len {
        out = out
            .into_iter()
            .flat_map(|prefix| alphabet.iter().map(move |c| format!("{prefix}{c}")))
            .collect();
    }
    out
}
