//! Error types for Tessera ledger core operations

use crate::types::ContentHash;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors that can occur in ledger core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    // === Transaction Validation ===
    /// Transaction sender is empty
    #[error("Transaction sender must not be empty")]
    EmptySender,

    /// Transaction payload is empty
    #[error("Transaction payload must not be empty")]
    EmptyPayload,

    /// Payload exceeds maximum size
    #[error("Payload exceeds maximum size of {max} bytes")]
    PayloadTooLarge { max: usize },

    /// Stored transaction hash does not match its content
    #[error("Transaction hash mismatch: {0}")]
    TransactionHashMismatch(ContentHash),

    /// Transaction already pending or mined
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(ContentHash),

    /// Unknown transaction kind label
    #[error("Unknown transaction kind: {0}")]
    UnknownKind(String),

    // === Mining ===
    /// Nothing in the pending buffer
    #[error("No pending transactions to mine")]
    NoPendingTransactions,

    /// Another mine call owns the pending buffer
    #[error("Mining already in progress")]
    MiningInProgress,

    /// Nonce budget spent without meeting difficulty
    #[error("Mining budget exhausted after {attempts} attempts")]
    MiningBudgetExhausted { attempts: u64 },

    /// Caller cancelled the nonce search
    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    // === Integrity ===
    /// Chain has no genesis block
    #[error("Chain is empty")]
    EmptyChain,

    /// Genesis block differs from the canonical genesis
    #[error("Invalid genesis block")]
    InvalidGenesis,

    /// Block index out of sequence
    #[error("Block at position {position} has index {index}")]
    IndexMismatch { position: usize, index: u64 },

    /// Stored block hash differs from recomputation
    #[error("Block {index} hash mismatch")]
    BlockHashMismatch { index: u64 },

    /// previous_hash does not match predecessor
    #[error("Block {index} is not linked to its predecessor")]
    BrokenLink { index: u64 },

    /// Block hash does not satisfy difficulty
    #[error("Block {index} does not meet difficulty of {difficulty} bits")]
    InsufficientWork { index: u64, difficulty: u32 },

    // === Encoding ===
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChainError {
    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::EmptySender
            | Self::EmptyPayload
            | Self::PayloadTooLarge { .. }
            | Self::TransactionHashMismatch(_)
            | Self::DuplicateTransaction(_)
            | Self::UnknownKind(_) => 1001,
            Self::NoPendingTransactions
            | Self::MiningInProgress
            | Self::MiningBudgetExhausted { .. }
            | Self::MiningCancelled { .. } => 1002,
            Self::EmptyChain
            | Self::InvalidGenesis
            | Self::IndexMismatch { .. }
            | Self::BlockHashMismatch { .. }
            | Self::BrokenLink { .. }
            | Self::InsufficientWork { .. } => 1003,
            Self::Serialization(_) => 9999,
        }
    }

    /// Integrity failures are never auto-repaired
    pub fn is_integrity_failure(&self) -> bool {
        self.code() == 1003
    }

    /// Check if the operation may succeed when retried
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MiningInProgress
                | Self::MiningBudgetExhausted { .. }
                | Self::MiningCancelled { .. }
                | Self::NoPendingTransactions
        )
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
