//! Error types for the allocation contract

use crate::submission::SubmissionStatus;
use tessera_core::ContentHash;
use tessera_economics::{ContributionTier, EpochError, TokenomicsError};
use thiserror::Error;

/// Result type alias for contract operations
pub type Result<T> = std::result::Result<T, ContractError>;

/// Allocation contract errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    // Validation errors
    #[error("Contributor must not be empty")]
    EmptyContributor,

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Submission payload is {size} bytes, maximum is {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Evaluation {field} = {value} exceeds maximum {max}")]
    InvalidEvaluation {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Duplicate submission: {0}")]
    DuplicateSubmission(ContentHash),

    // State errors
    #[error("Unknown submission: {0}")]
    UnknownSubmission(ContentHash),

    #[error("Submission {hash} is {status}, expected pending")]
    NotPending {
        hash: ContentHash,
        status: SubmissionStatus,
    },

    #[error("Submission {hash} is {status}, expected approved")]
    NotApproved {
        hash: ContentHash,
        status: SubmissionStatus,
    },

    #[error("Submission {0} has no tiers left to allocate")]
    FullyAllocated(ContentHash),

    #[error("Submission {hash} does not qualify for tier {tier}")]
    TierNotQualified {
        hash: ContentHash,
        tier: ContributionTier,
    },

    #[error("Submission {hash} already allocated tier {tier}")]
    TierAlreadyAllocated {
        hash: ContentHash,
        tier: ContributionTier,
    },

    // External and integrity errors
    #[error("Evaluator failed: {0}")]
    Evaluator(String),

    #[error("Inconsistent archive: {0}")]
    InconsistentArchive(String),

    #[error(transparent)]
    Tokenomics(#[from] TokenomicsError),

    #[error(transparent)]
    Epoch(#[from] EpochError),
}

impl ContractError {
    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::EmptyContributor
            | Self::EmptyContent
            | Self::PayloadTooLarge { .. }
            | Self::InvalidEvaluation { .. }
            | Self::DuplicateSubmission(_) => 3001,
            Self::UnknownSubmission(_)
            | Self::NotPending { .. }
            | Self::NotApproved { .. }
            | Self::FullyAllocated(_)
            | Self::TierNotQualified { .. }
            | Self::TierAlreadyAllocated { .. } => 3002,
            Self::Evaluator(_) => 3003,
            Self::InconsistentArchive(_) => 3004,
            Self::Tokenomics(e) => e.code(),
            Self::Epoch(_) => 2004,
        }
    }

    /// Check if a retry may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Evaluator(_) => true,
            Self::Tokenomics(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ContractError::EmptyContent.code(), 3001);
        assert_eq!(ContractError::UnknownSubmission(ContentHash::ZERO).code(), 3002);
        assert_eq!(
            ContractError::from(TokenomicsError::InvalidContributor).code(),
            2001
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(ContractError::Evaluator("timeout".into()).is_recoverable());
        assert!(!ContractError::EmptyContributor.is_recoverable());
    }
}
