//! # Tessera Contract
//!
//! Allocation contract for scored contributions.
//!
//! ```text
//!  submit ──► pending ──evaluate──► approved ──allocate──► reward per tier
//!                          │                                    │
//!                          └──► rejected                        ▼
//!                                                     TokenSupplyLedger
//! ```
//!
//! The canonical [`AllocationContract`] owns submissions and mutates the
//! supply ledger. The [`MirrorLayer`] keeps a provisional copy refreshed from
//! [`ReconciliationSnapshot`]s for previews.

pub mod category;
pub mod contract;
pub mod error;
pub mod evaluator;
pub mod mirror;
pub mod score;
pub mod submission;

pub use category::{tier_for_category, tiers_for_categories};
pub use contract::{
    AllocationAttempt, AllocationContract, AllocationOutcome, ContractArchive, ContractConfig,
    ContractExport, ContractStats, ContributorActivity, ContributorSummary, LockedEpochPolicy,
};
pub use error::{ContractError, Result};
pub use evaluator::{Evaluation, EvaluationStatus, Evaluator};
pub use mirror::{MirrorLayer, ReconciliationSnapshot};
pub use score::{composite_score, evaluation_score, qualify_epoch};
pub use submission::{Submission, SubmissionPayload, SubmissionStatus, MAX_SUBMISSION_SIZE};
