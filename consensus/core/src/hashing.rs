use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display, Formatter};

pub const HASH_SIZE: usize = 32;

/// A 32-byte identifier (block hash, transaction id, asset tag).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    /// Builds a hash from a single u64 word, zero padded. Useful for tests.
    pub const fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let word_bytes = word.to_le_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[i] = word_bytes[i];
            i += 1;
        }
        Hash(bytes)
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&faster_hex::hex_string(&self.0))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Incremental double-SHA256 writer with little-endian integer helpers.
#[derive(Clone)]
pub struct HashWriter(Sha256);

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HashWriter {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(bytes);
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u64(bytes.len() as u64);
        self.write(bytes)
    }

    pub fn finalize(self) -> Hash {
        let first = self.0.finalize();
        let second = Sha256::digest(first);
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(&second);
        Hash(bytes)
    }
}

/// Double-SHA256 of a byte slice.
pub fn double_sha256(data: &[u8]) -> Hash {
    let mut writer = HashWriter::new();
    writer.write(data);
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_display_roundtrip() {
        let hash = Hash::from_u64_word(0xdead_beef);
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("efbeadde"));
    }

    #[test]
    fn test_double_sha256_matches_incremental() {
        let data = b"diadem block assembly";
        let mut writer = HashWriter::new();
        writer.write(&data[..6]).write(&data[6..]);
        assert_eq!(writer.finalize(), double_sha256(data));
    }

    #[test]
    fn test_zero_hash() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::from_u64_word(1).is_zero());
    }
}
