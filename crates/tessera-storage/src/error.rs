//! Storage error types

use std::path::PathBuf;
use tessera_contract::ContractError;
use tessera_core::ChainError;
use tessera_economics::TokenomicsError;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error in {document}: {message}")]
    Serialization {
        document: &'static str,
        message: String,
    },

    #[error("Unsupported {document} format version {found}, expected {expected}")]
    UnsupportedFormat {
        document: &'static str,
        found: u32,
        expected: u32,
    },

    #[error("Chain document rejected: {0}")]
    Chain(#[from] ChainError),

    #[error("Ledger document rejected: {0}")]
    Ledger(#[from] TokenomicsError),

    #[error("Archive rejected: {0}")]
    Archive(#[from] ContractError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::Io { .. } => 4001,
            Self::Serialization { .. } | Self::UnsupportedFormat { .. } => 4002,
            Self::Chain(_) | Self::Ledger(_) | Self::Archive(_) => 4003,
        }
    }

    /// I/O failures may clear up on retry; rejected documents will not
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let io = StorageError::io("/tmp/x", std::io::Error::other("disk"));
        assert_eq!(io.code(), 4001);
        assert!(io.is_recoverable());
        assert!(io.to_string().contains("/tmp/x"));

        let chain = StorageError::from(ChainError::EmptyChain);
        assert_eq!(chain.code(), 4003);
        assert!(!chain.is_recoverable());
    }
}
