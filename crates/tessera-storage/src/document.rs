//! Persisted document kinds and their versioned envelope

use crate::error::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::now_millis;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// The three documents making up node state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Blocks and pending transactions
    Chain,
    /// Token supply ledger
    Ledger,
    /// Submissions, contributor counters and epoch state
    Archive,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Chain, Self::Ledger, Self::Archive];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chain => "chain",
            Self::Ledger => "ledger",
            Self::Archive => "archive",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Chain => "chain.json",
            Self::Ledger => "ledger.json",
            Self::Archive => "archive.json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    format: u32,
    saved_at: i64,
    body: T,
}

/// Serialize a document body inside a versioned envelope
pub fn encode<T: Serialize>(kind: DocumentKind, body: &T) -> Result<Vec<u8>> {
    let envelope = Envelope {
        format: FORMAT_VERSION,
        saved_at: now_millis(),
        body,
    };
    serde_json::to_vec_pretty(&envelope).map_err(|e| StorageError::Serialization {
        document: kind.name(),
        message: e.to_string(),
    })
}

/// Parse an envelope, rejecting unknown format versions
pub fn decode<T: DeserializeOwned>(kind: DocumentKind, bytes: &[u8]) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization {
            document: kind.name(),
            message: e.to_string(),
        })?;
    if envelope.format != FORMAT_VERSION {
        return Err(StorageError::UnsupportedFormat {
            document: kind.name(),
            found: envelope.format,
            expected: FORMAT_VERSION,
        });
    }
    Ok(envelope.body)
}
