//! External evaluation interface
//!
//! Scoring of submission content happens outside this crate. An
//! [`Evaluator`] returns four dimensions on `0..=10_000` plus a verdict.

use crate::error::{ContractError, Result};
use crate::submission::SubmissionPayload;
use serde::{Deserialize, Serialize};
use tessera_economics::SCORE_SCALE;

/// Evaluator verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Approved,
    Rejected,
}

/// Scored evaluation of a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Internal consistency; feeds epoch progress and halving
    pub coherence: u32,
    /// Information density; selects the qualifying epoch
    pub density: u32,
    pub novelty: u32,
    /// Overlap with prior work (recorded, not scored)
    pub redundancy: u32,
    pub status: EvaluationStatus,
}

impl Evaluation {
    pub fn approved(coherence: u32, density: u32, novelty: u32) -> Self {
        Self {
            coherence,
            density,
            novelty,
            redundancy: 0,
            status: EvaluationStatus::Approved,
        }
    }

    pub fn rejected() -> Self {
        Self {
            coherence: 0,
            density: 0,
            novelty: 0,
            redundancy: 0,
            status: EvaluationStatus::Rejected,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == EvaluationStatus::Approved
    }

    /// Every dimension must lie in `0..=SCORE_SCALE`
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("coherence", self.coherence),
            ("density", self.density),
            ("novelty", self.novelty),
            ("redundancy", self.redundancy),
        ] {
            if value > SCORE_SCALE {
                return Err(ContractError::InvalidEvaluation {
                    field,
                    value,
                    max: SCORE_SCALE,
                });
            }
        }
        Ok(())
    }
}

/// Source of evaluations
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, payload: &SubmissionPayload) -> Result<Evaluation>;
}

impl<F> Evaluator for F
where
    F: Fn(&SubmissionPayload) -> Result<Evaluation> + Send + Sync,
{
    fn evaluate(&self, payload: &SubmissionPayload) -> Result<Evaluation> {
        self(payload)
    }
}
