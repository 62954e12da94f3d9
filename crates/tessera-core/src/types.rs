//! Core type definitions for Tessera
//!
//! Content-addressed identifiers and the constants shared by every ledger
//! component.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// ContentHash - 256-bit BLAKE3 digest identifying transactions, blocks and submissions
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash {
    hash: [u8; 32],
}

impl ContentHash {
    /// Create a new ContentHash from raw bytes
    pub fn new(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Parse from a 64 character hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut hash = [0u8; 32];
        hex::decode_to_slice(s, &mut hash)?;
        Ok(Self { hash })
    }

    /// Number of leading zero bits, used by the proof-of-work gate
    pub fn leading_zero_bits(&self) -> u32 {
        let mut bits = 0;
        for byte in self.hash {
            if byte == 0 {
                bits += 8;
            } else {
                bits += byte.leading_zeros();
                break;
            }
        }
        bits
    }

    /// Zero hash (genesis parent)
    pub const ZERO: Self = Self { hash: [0u8; 32] };
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex in human-readable formats (JSON documents), raw bytes otherwise.
impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.hash.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            struct HexVisitor;

            impl<'de> Visitor<'de> for HexVisitor {
                type Value = ContentHash;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a 64 character hex string")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<ContentHash, E> {
                    ContentHash::from_hex(v).map_err(E::custom)
                }
            }

            deserializer.deserialize_str(HexVisitor)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(ContentHash::new)
        }
    }
}

/// Current wall-clock time in Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Ledger constants
pub mod constants {
    /// Default proof-of-work difficulty in leading zero bits
    pub const DEFAULT_DIFFICULTY: u32 = 8;

    /// Default nonce attempts a single `mine` call may spend
    pub const DEFAULT_MINING_ATTEMPTS: u64 = 10_000_000;

    /// Maximum transaction payload size (64KB)
    pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

    /// Genesis block timestamp (2026-01-01T00:00:00Z, milliseconds)
    pub const GENESIS_TIMESTAMP: i64 = 1_767_225_600_000;

    /// Proposer recorded on the genesis block
    pub const GENESIS_PROPOSER: &str = "genesis";

    /// Attempts between cancellation checks during nonce search
    pub const CANCEL_CHECK_INTERVAL: u64 = 1024;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FieldHasher;

    #[test]
    fn test_content_hash_creation() {
        let id = FieldHasher::new().field(b"test content").finalize();

        assert_ne!(id, ContentHash::ZERO);
        assert_eq!(id.as_bytes().len(), 32);
    }

    #[test]
    fn test_content_hash_hex_roundtrip() {
        let id = FieldHasher::new().field(b"test content").finalize();
        let parsed: ContentHash = id.to_hex().parse().unwrap();

        assert_eq!(id, parsed);
        assert!(ContentHash::from_hex("abc").is_err());
    }

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(ContentHash::ZERO.leading_zero_bits(), 256);

        let mut bytes = [0xffu8; 32];
        assert_eq!(ContentHash::new(bytes).leading_zero_bits(), 0);

        bytes[0] = 0;
        bytes[1] = 0b0001_0000;
        assert_eq!(ContentHash::new(bytes).leading_zero_bits(), 11);
    }

    #[test]
    fn test_serde_hex_format() {
        let id = FieldHasher::new().field(b"serde").finalize();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
