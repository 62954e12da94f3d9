//! Submission records
//!
//! A submission is content-addressed by its payload. Records are append-only:
//! status moves `pending → approved | rejected` and is never reverted.

use crate::category::tiers_for_categories;
use crate::error::{ContractError, Result};
use crate::evaluator::Evaluation;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::hash::FieldHasher;
use tessera_core::ContentHash;
use tessera_economics::{ContributionTier, Epoch};

/// Largest accepted submission payload, leaving room for the transaction envelope
pub const MAX_SUBMISSION_SIZE: usize = 60 * 1024;

/// Contributor-supplied payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub contributor: String,
    pub content: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl SubmissionPayload {
    pub fn new(
        contributor: impl Into<String>,
        content: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            contributor: contributor.into(),
            content: content.into(),
            categories,
        }
    }

    /// Shape validation
    pub fn validate(&self) -> Result<()> {
        if self.contributor.trim().is_empty() {
            return Err(ContractError::EmptyContributor);
        }
        if self.content.trim().is_empty() {
            return Err(ContractError::EmptyContent);
        }
        let size = self.contributor.len()
            + self.content.len()
            + self.categories.iter().map(String::len).sum::<usize>();
        if size > MAX_SUBMISSION_SIZE {
            return Err(ContractError::PayloadTooLarge {
                size,
                max: MAX_SUBMISSION_SIZE,
            });
        }
        Ok(())
    }

    /// Content address of the payload
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = FieldHasher::new()
            .field(self.contributor.as_bytes())
            .field(self.content.as_bytes())
            .u64(self.categories.len() as u64);
        for category in &self.categories {
            hasher = hasher.field(category.as_bytes());
        }
        hasher.finalize()
    }
}

/// Submission lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stored submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub hash: ContentHash,
    pub payload: SubmissionPayload,
    /// Tier of the first category
    pub tier: ContributionTier,
    /// All distinct qualifying tiers, highest first
    pub tiers: Vec<ContributionTier>,
    pub status: SubmissionStatus,
    pub evaluation: Option<Evaluation>,
    pub score: Option<u32>,
    pub qualified_epoch: Option<Epoch>,
    pub allocated_tiers: Vec<ContributionTier>,
    /// Coherence already fed to the halving accumulator
    #[serde(default)]
    pub usage_recorded: bool,
    pub submitted_at: i64,
}

impl Submission {
    /// Validate a payload and build a pending record
    pub fn new(payload: SubmissionPayload, submitted_at: i64) -> Result<Self> {
        payload.validate()?;
        let (tier, tiers) = tiers_for_categories(&payload.categories);
        Ok(Self {
            hash: payload.content_hash(),
            payload,
            tier,
            tiers,
            status: SubmissionStatus::Pending,
            evaluation: None,
            score: None,
            qualified_epoch: None,
            allocated_tiers: Vec::new(),
            usage_recorded: false,
            submitted_at,
        })
    }

    pub fn contributor(&self) -> &str {
        &self.payload.contributor
    }

    /// Qualifying tiers not yet allocated, highest first
    pub fn remaining_tiers(&self) -> Vec<ContributionTier> {
        self.tiers
            .iter()
            .copied()
            .filter(|t| !self.allocated_tiers.contains(t))
            .collect()
    }

    pub fn is_fully_allocated(&self) -> bool {
        self.status == SubmissionStatus::Approved && self.remaining_tiers().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_validation() {
        assert_eq!(
            SubmissionPayload::new(" ", "x", vec![]).validate(),
            Err(ContractError::EmptyContributor)
        );
        assert_eq!(
            SubmissionPayload::new("a", "", vec![]).validate(),
            Err(ContractError::EmptyContent)
        );
        let big = "x".repeat(MAX_SUBMISSION_SIZE + 1);
        assert!(matches!(
            SubmissionPayload::new("a", big, vec![]).validate(),
            Err(ContractError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_content_hash_covers_categories() {
        let a = SubmissionPayload::new("a", "c", vec!["math".into()]);
        let b = SubmissionPayload::new("a", "c", vec!["software".into()]);
        let c = SubmissionPayload::new("a", "c", vec!["math".into()]);
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_new_submission_is_pending() {
        let payload = SubmissionPayload::new("alice", "proof", vec!["software".into(), "physics".into()]);
        let sub = Submission::new(payload, 10).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Pending);
        assert_eq!(sub.tier, ContributionTier::Silver);
        assert_eq!(sub.remaining_tiers(), vec![ContributionTier::Gold, ContributionTier::Silver]);
        assert!(!sub.is_fully_allocated());
    }
}
