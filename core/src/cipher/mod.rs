//! cipher/mod.rs
//! Traditional PKWARE stream cipher (APPNOTE 6.1).
//!
//! Three 32-bit keys are seeded from the password, then every plaintext byte
//! updates the keys. The keystream byte depends only on `key2`.

use crate::constants::cipher_keys::{KEY0, KEY1, KEY1_MULTIPLIER, KEY2};
use crate::constants::zip_format::CIPHER_HEADER_LEN;

/// CRC-32 (reflected, poly 0xEDB88320) lookup table, built at compile time.
const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

#[inline]
fn crc_update(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xff) as usize]
}

/// Running key state of the traditional cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipCryptoKeys {
    k0: u32,
    k1: u32,
    k2: u32,
}

impl Default for ZipCryptoKeys {
    fn default() -> Self {
        Self { k0: KEY0, k1: KEY1, k2: KEY2 }
    }
}

impl ZipCryptoKeys {
    /// Key state after absorbing every password byte.
    pub fn from_password(password: &[u8]) -> Self {
        let mut keys = Self::default();
        for &b in password {
            keys.update(b);
        }
        keys
    }

    #[inline]
    pub fn update(&mut self, plain: u8) {
        self.k0 = crc_update(self.k0, plain);
        self.k1 = self
            .k1
            .wrapping_add(self.k0 & 0xff)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        self.k2 = crc_update(self.k2, (self.k1 >> 24) as u8);
    }

    #[inline]
    pub fn stream_byte(&self) -> u8 {
        let t = (self.k2 | 2) & 0xffff;
        ((t.wrapping_mul(t ^ 1)) >> 8) as u8
    }

    #[inline]
    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.stream_byte();
        self.update(plain);
        plain
    }

    #[inline]
    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.stream_byte();
        self.update(plain);
        cipher
    }

    pub fn decrypt_in_place(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.decrypt_byte(*b);
        }
    }

    pub fn encrypt_in_place(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.encrypt_byte(*b);
        }
    }
}

/// Fast password test: decrypt the 12-byte header and compare its last byte.
/// Matches roughly 1 in 256 wrong passwords as well.
pub fn header_check(password: &[u8], header: &[u8; CIPHER_HEADER_LEN], check: u8) -> bool {
    let mut keys = ZipCryptoKeys::from_password(password);
    let mut last = 0u8;
    for &c in header {
        last = keys.decrypt_byte(c);
    }
    last == check
}

/// Full decrypt of a stored entry (`header || data`) with CRC-32 comparison.
pub fn confirm_stored(password: &[u8], encrypted: &[u8], expected_crc: u32) -> bool {
    if encrypted.len() < CIPHER_HEADER_LEN {
        return false;
    }
    let mut keys = ZipCryptoKeys::from_password(password);
    let mut plain = encrypted.to_vec();
    keys.decrypt_in_place(&mut plain);
    crc32fast::hash(&plain[CIPHER_HEADER_LEN..]) == expected_crc
}
