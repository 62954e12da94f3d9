//! Chain transaction payloads
//!
//! The ledger core treats payloads as opaque text; these are the JSON bodies
//! the node writes for each step of a submission's lifecycle.

use serde::{Deserialize, Serialize};
use tessera_contract::{AllocationAttempt, Evaluation, Submission, SubmissionPayload};
use tessera_core::ContentHash;
use tessera_economics::{ContributionTier, Epoch};

/// A contribution registered as pending
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub submission: ContentHash,
    pub payload: SubmissionPayload,
    pub tiers: Vec<ContributionTier>,
}

impl SubmissionEntry {
    pub fn new(submission: ContentHash, payload: SubmissionPayload) -> Self {
        let (_, tiers) = tessera_contract::tiers_for_categories(&payload.categories);
        Self {
            submission,
            payload,
            tiers,
        }
    }
}

/// An evaluator result applied to a submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationEntry {
    pub submission: ContentHash,
    pub evaluation: Evaluation,
    pub score: Option<u32>,
    pub qualified_epoch: Option<Epoch>,
}

impl From<&Submission> for EvaluationEntry {
    fn from(submission: &Submission) -> Self {
        Self {
            submission: submission.hash,
            evaluation: submission.evaluation.unwrap_or_else(Evaluation::rejected),
            score: submission.score,
            qualified_epoch: submission.qualified_epoch,
        }
    }
}

/// A committed tier allocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub submission: ContentHash,
    pub contributor: String,
    pub tier: ContributionTier,
    pub epoch: Epoch,
    pub score: u32,
    pub reward: u128,
    pub balance_before: u128,
    pub balance_after: u128,
}

impl AllocationEntry {
    pub fn new(
        submission: ContentHash,
        contributor: impl Into<String>,
        score: u32,
        attempt: &AllocationAttempt,
    ) -> Self {
        Self {
            submission,
            contributor: contributor.into(),
            tier: attempt.tier,
            epoch: attempt.epoch,
            score,
            reward: attempt.reward,
            balance_before: attempt.balance_before,
            balance_after: attempt.balance_after,
        }
    }
}
