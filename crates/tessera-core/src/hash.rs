//! BLAKE3 hashing utilities for Tessera
//!
//! All ledger digests use BLAKE3 with 256-bit output. Variable-length fields
//! are length-prefixed so that distinct field splits can never collide.

use crate::types::ContentHash;

/// Incremental hasher for canonical field-by-field digests
pub struct FieldHasher {
    hasher: blake3::Hasher,
}

impl FieldHasher {
    /// Create new hasher
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    /// Append a fixed-width field
    pub fn fixed(mut self, data: &[u8]) -> Self {
        self.hasher.update(data);
        self
    }

    /// Append a variable-width field with a u64 length prefix
    pub fn field(mut self, data: &[u8]) -> Self {
        self.hasher.update(&(data.len() as u64).to_be_bytes());
        self.hasher.update(data);
        self
    }

    /// Append a big-endian u64
    pub fn u64(self, value: u64) -> Self {
        self.fixed(&value.to_be_bytes())
    }

    /// Append a big-endian i64
    pub fn i64(self, value: i64) -> Self {
        self.fixed(&value.to_be_bytes())
    }

    /// Finalize and get hash
    pub fn finalize(self) -> ContentHash {
        ContentHash::new(*self.hasher.finalize().as_bytes())
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}
