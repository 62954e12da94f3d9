//! Error types for tokenomics operations

use crate::epoch::Epoch;
use crate::supply::UnavailableReason;
use thiserror::Error;

/// Result type alias for tokenomics operations
pub type Result<T> = std::result::Result<T, TokenomicsError>;

/// Epoch controller errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EpochError {
    /// Epoch name not recognised
    #[error("Unknown epoch: {0}")]
    UnknownEpoch(String),

    /// Threshold table rejected
    #[error("Invalid epoch thresholds: {0}")]
    InvalidThresholds(String),

    /// Advance target is not the successor of the current epoch
    #[error("Cannot advance from {current} to {requested}: not the immediate successor")]
    NotImmediateSuccessor { current: Epoch, requested: Epoch },

    /// Progress counter below the unlock threshold
    #[error("Epoch {epoch} requires progress {required}, have {progress}")]
    ThresholdNotMet {
        epoch: Epoch,
        required: u64,
        progress: u64,
    },

    /// Already in the last epoch
    #[error("Already in terminal epoch {0}")]
    TerminalEpoch(Epoch),

    /// Restored state violates controller invariants
    #[error("Inconsistent epoch state: {0}")]
    InconsistentState(String),
}

/// Token supply ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenomicsError {
    /// Score outside 0..=max
    #[error("Score {score} exceeds maximum {max}")]
    InvalidScore { score: u32, max: u32 },

    /// Tier name not recognised
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// Parameters rejected at construction
    #[error("Invalid tokenomics parameters: {0}")]
    InvalidParams(String),

    /// Contributor identifier empty
    #[error("Contributor must not be empty")]
    InvalidContributor,

    /// Allocation refused by an availability rule
    #[error("Allocation unavailable: {0}")]
    Unavailable(UnavailableReason),

    /// Quote no longer matches ledger state
    #[error("Allocation quote is stale for {epoch}: quoted balance {quoted}, current {current}")]
    StaleQuote {
        epoch: Epoch,
        quoted: u128,
        current: u128,
    },

    /// Supply conservation check failed
    #[error("Conservation violated: expected {expected}, accounted {actual}")]
    ConservationViolated { expected: u128, actual: u128 },

    /// Restored state violates ledger invariants
    #[error("Inconsistent ledger state: {0}")]
    InconsistentState(String),

    /// Epoch controller error
    #[error(transparent)]
    Epoch(#[from] EpochError),
}

impl TokenomicsError {
    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidScore { .. }
            | Self::UnknownTier(_)
            | Self::InvalidParams(_)
            | Self::InvalidContributor => 2001,
            Self::Unavailable(_) | Self::StaleQuote { .. } => 2002,
            Self::ConservationViolated { .. } | Self::InconsistentState(_) => 2003,
            Self::Epoch(_) => 2004,
        }
    }

    /// Check if a fresh attempt may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StaleQuote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::ContributionTier;

    #[test]
    fn test_error_codes() {
        assert_eq!(TokenomicsError::InvalidContributor.code(), 2001);
        let locked = UnavailableReason::TierLocked {
            tier: ContributionTier::Copper,
            epoch: Epoch::Founding,
        };
        assert_eq!(TokenomicsError::Unavailable(locked).code(), 2002);
        assert_eq!(
            TokenomicsError::from(EpochError::TerminalEpoch(Epoch::Abundance)).code(),
            2004
        );
    }

    #[test]
    fn test_error_display() {
        let err = EpochError::NotImmediateSuccessor {
            current: Epoch::Founding,
            requested: Epoch::Maturity,
        };
        assert!(err.to_string().contains("founding"));
        assert!(err.to_string().contains("maturity"));
    }
}
