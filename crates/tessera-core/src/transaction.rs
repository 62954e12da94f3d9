//! Transaction - the unit recorded in blocks
//!
//! A transaction carries an opaque, already-canonical payload produced by the
//! orchestrator. The ledger core never interprets payloads; it only hashes and
//! orders them.

use crate::error::{ChainError, Result};
use crate::hash::FieldHasher;
use crate::types::{constants, now_millis, ContentHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction kinds recorded on the chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// A contribution was registered
    Submission,

    /// An evaluator result was recorded
    Evaluation,

    /// Tokens were allocated from an epoch pool
    Allocation,
}

impl TransactionKind {
    /// Convert to u8 for hashing
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Submission => 0,
            Self::Evaluation => 1,
            Self::Allocation => 2,
        }
    }

    /// Lowercase label
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Evaluation => "evaluation",
            Self::Allocation => "allocation",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransactionKind {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submission" => Ok(Self::Submission),
            "evaluation" => Ok(Self::Evaluation),
            "allocation" => Ok(Self::Allocation),
            other => Err(ChainError::UnknownKind(other.to_string())),
        }
    }
}

/// Immutable ledger transaction; identity is its content hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    kind: TransactionKind,
    payload: String,
    sender: String,
    hash: ContentHash,
    timestamp: i64,
}

impl Transaction {
    /// Create a transaction stamped with the current time
    pub fn new(kind: TransactionKind, sender: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::with_timestamp(kind, sender, payload, now_millis())
    }

    /// Create a transaction with an explicit timestamp (Unix ms)
    pub fn with_timestamp(
        kind: TransactionKind,
        sender: impl Into<String>,
        payload: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let sender = sender.into();
        let payload = payload.into();
        let hash = Self::compute_hash(kind, &sender, &payload, timestamp);
        Self {
            kind,
            payload,
            sender,
            hash,
            timestamp,
        }
    }

    /// Create a transaction whose payload is the JSON encoding of `value`
    pub fn from_json<T: Serialize>(
        kind: TransactionKind,
        sender: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        let payload = serde_json::to_string(value)?;
        Ok(Self::new(kind, sender, payload))
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn compute_hash(kind: TransactionKind, sender: &str, payload: &str, timestamp: i64) -> ContentHash {
        FieldHasher::new()
            .fixed(&[kind.as_u8()])
            .field(sender.as_bytes())
            .field(payload.as_bytes())
            .i64(timestamp)
            .finalize()
    }

    /// Canonical byte encoding used inside block hashes
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sender.len() + self.payload.len() + 64);
        out.push(self.kind.as_u8());
        out.extend_from_slice(&(self.sender.len() as u64).to_be_bytes());
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&(self.payload.len() as u64).to_be_bytes());
        out.extend_from_slice(self.payload.as_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(self.hash.as_bytes());
        out
    }

    /// Recompute the content hash from the stored fields
    pub fn recompute_hash(&self) -> ContentHash {
        Self::compute_hash(self.kind, &self.sender, &self.payload, self.timestamp)
    }

    /// Shape validation: non-empty sender and payload, bounded size, consistent hash
    pub fn validate(&self) -> Result<()> {
        if self.sender.trim().is_empty() {
            return Err(ChainError::EmptySender);
        }
        if self.payload.is_empty() {
            return Err(ChainError::EmptyPayload);
        }
        if self.payload.len() > constants::MAX_PAYLOAD_SIZE {
            return Err(ChainError::PayloadTooLarge {
                max: constants::MAX_PAYLOAD_SIZE,
            });
        }
        if self.recompute_hash() != self.hash {
            return Err(ChainError::TransactionHashMismatch(self.hash));
        }
        Ok(())
    }

    /// Decode the payload as JSON
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    #[cfg(test)]
    pub(crate) fn payload_mut(&mut self) -> &mut String {
        &mut self.payload
    }
}
