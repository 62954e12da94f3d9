//! Contribution allocation contract
//!
//! Orchestrates submissions, evaluations and allocations against the epoch
//! controller and the token supply ledger. The contract owns submission
//! records and only touches balances through
//! [`TokenSupplyLedger::record_allocation`].
//!
//! Locks are always taken in the order
//! `submissions → epochs → ledger → contributors`.

use crate::error::{ContractError, Result};
use crate::evaluator::{Evaluation, Evaluator};
use crate::mirror::ReconciliationSnapshot;
use crate::score::{evaluation_score, qualify_epoch};
use crate::submission::{Submission, SubmissionPayload, SubmissionStatus};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tessera_core::{now_millis, ContentHash};
use tessera_economics::{
    AllocationQuote, ContributionTier, ContributorBalance, Epoch, EpochController, EpochStats,
    EpochThresholds, LedgerStats, TokenSupplyLedger, TokenomicsParams, UnavailableReason,
};

/// Handling of allocations whose qualified epoch is not yet globally unlocked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockedEpochPolicy {
    /// Draw from the qualified epoch's pool regardless of unlock state
    #[default]
    Allow,
    /// Fail the attempt with `EpochLocked`
    Reject,
}

impl fmt::Display for LockedEpochPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for LockedEpochPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown locked epoch policy: {other}")),
        }
    }
}

/// Contract construction parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub locked_epoch_policy: LockedEpochPolicy,
    pub thresholds: EpochThresholds,
    pub tokenomics: TokenomicsParams,
}

/// One tier's allocation attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationAttempt {
    pub tier: ContributionTier,
    pub epoch: Epoch,
    pub success: bool,
    pub reason: Option<UnavailableReason>,
    pub reward: u128,
    pub balance_before: u128,
    pub balance_after: u128,
    /// Halvings triggered by this attempt
    pub halvings: u64,
    pub timestamp: i64,
}

impl AllocationAttempt {
    fn failed(quote: &AllocationQuote, reason: UnavailableReason, timestamp: i64) -> Self {
        Self {
            tier: quote.tier,
            epoch: quote.epoch,
            success: false,
            reason: Some(reason),
            reward: quote.reward,
            balance_before: quote.balance_before,
            balance_after: quote.balance_before,
            halvings: 0,
            timestamp,
        }
    }
}

/// Result of allocating every outstanding tier of a submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub submission_hash: ContentHash,
    pub contributor: String,
    pub epoch: Epoch,
    pub score: u32,
    pub attempts: Vec<AllocationAttempt>,
}

impl AllocationOutcome {
    pub fn total_reward(&self) -> u128 {
        self.attempts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.reward)
            .sum()
    }

    pub fn successes(&self) -> usize {
        self.attempts.iter().filter(|a| a.success).count()
    }

    pub fn any_success(&self) -> bool {
        self.successes() > 0
    }
}

/// Per-contributor submission counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorActivity {
    pub submissions: u64,
    pub approved: u64,
    pub rejected: u64,
}

/// Contributor counters joined with their ledger balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub contributor: String,
    pub activity: ContributorActivity,
    pub balance: ContributorBalance,
}

/// Contract summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
    pub submissions: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub fully_allocated: usize,
    pub contributors: usize,
    pub current_epoch: Epoch,
    pub progress: u64,
    pub distributed: u128,
    pub remaining: u128,
    pub halving_count: u64,
    pub policy: LockedEpochPolicy,
}

/// Persisted contract state other than the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArchive {
    pub submissions: Vec<Submission>,
    pub contributors: BTreeMap<String, ContributorActivity>,
    pub epochs: EpochController,
    pub exported_at: i64,
}

/// Archive and ledger captured under one set of locks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractExport {
    pub archive: ContractArchive,
    pub ledger: TokenSupplyLedger,
}

/// Canonical allocation contract
pub struct AllocationContract {
    policy: LockedEpochPolicy,
    submissions: RwLock<IndexMap<ContentHash, Submission>>,
    epochs: RwLock<EpochController>,
    ledger: RwLock<TokenSupplyLedger>,
    contributors: RwLock<BTreeMap<String, ContributorActivity>>,
}

impl AllocationContract {
    /// Fresh contract with a full supply
    pub fn new(config: ContractConfig) -> Result<Self> {
        let ledger = TokenSupplyLedger::new(config.tokenomics)?;
        Ok(Self {
            policy: config.locked_epoch_policy,
            submissions: RwLock::new(IndexMap::new()),
            epochs: RwLock::new(EpochController::new(config.thresholds)),
            ledger: RwLock::new(ledger),
            contributors: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn policy(&self) -> LockedEpochPolicy {
        self.policy
    }

    /// Record a new pending submission
    pub fn submit(&self, payload: SubmissionPayload) -> Result<ContentHash> {
        self.submit_at(payload, now_millis())
    }

    pub fn submit_at(&self, payload: SubmissionPayload, timestamp: i64) -> Result<ContentHash> {
        let submission = Submission::new(payload, timestamp)?;
        let hash = submission.hash;
        let contributor = submission.contributor().to_string();
        let tier = submission.tier;

        let mut submissions = self.submissions.write();
        if submissions.contains_key(&hash) {
            return Err(ContractError::DuplicateSubmission(hash));
        }
        submissions.insert(hash, submission);
        tracing::info!(%hash, contributor = %contributor, %tier, "Submission recorded");
        self.contributors
            .write()
            .entry(contributor)
            .or_default()
            .submissions += 1;

        Ok(hash)
    }

    /// Apply an evaluation to a pending submission
    ///
    /// Approval fixes the composite score and qualifying epoch and adds the
    /// coherence to global epoch progress.
    pub fn record_evaluation(&self, hash: ContentHash, evaluation: Evaluation) -> Result<Submission> {
        evaluation.validate()?;

        let mut submissions = self.submissions.write();
        let submission = submissions
            .get_mut(&hash)
            .ok_or(ContractError::UnknownSubmission(hash))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(ContractError::NotPending {
                hash,
                status: submission.status,
            });
        }

        submission.evaluation = Some(evaluation);
        if evaluation.is_approved() {
            let score = evaluation_score(&evaluation);
            let epoch = qualify_epoch(evaluation.density);
            submission.status = SubmissionStatus::Approved;
            submission.score = Some(score);
            submission.qualified_epoch = Some(epoch);
            self.epochs
                .write()
                .record_progress(u64::from(evaluation.coherence));
            tracing::info!(%hash, score, %epoch, "Submission approved");
        } else {
            submission.status = SubmissionStatus::Rejected;
            tracing::info!(%hash, "Submission rejected");
        }

        let snapshot = submission.clone();
        let mut contributors = self.contributors.write();
        let activity = contributors
            .entry(snapshot.contributor().to_string())
            .or_default();
        match snapshot.status {
            SubmissionStatus::Approved => activity.approved += 1,
            _ => activity.rejected += 1,
        }
        Ok(snapshot)
    }

    /// Evaluate through an external evaluator, then record the result
    pub fn evaluate_with(&self, hash: ContentHash, evaluator: &dyn Evaluator) -> Result<Submission> {
        let payload = {
            let submissions = self.submissions.read();
            let submission = submissions
                .get(&hash)
                .ok_or(ContractError::UnknownSubmission(hash))?;
            if submission.status != SubmissionStatus::Pending {
                return Err(ContractError::NotPending {
                    hash,
                    status: submission.status,
                });
            }
            submission.payload.clone()
        };

        let evaluation = evaluator.evaluate(&payload)?;
        self.record_evaluation(hash, evaluation)
    }

    /// Attempt every outstanding tier against the qualified epoch
    ///
    /// Attempts run highest tier first and succeed or fail independently.
    pub fn allocate(&self, hash: ContentHash) -> Result<AllocationOutcome> {
        let timestamp = now_millis();
        let mut submissions = self.submissions.write();
        let submission = submissions
            .get_mut(&hash)
            .ok_or(ContractError::UnknownSubmission(hash))?;
        let (score, epoch) = approved_terms(submission)?;

        let remaining = submission.remaining_tiers();
        if remaining.is_empty() {
            return Err(ContractError::FullyAllocated(hash));
        }

        let epochs = self.epochs.read();
        let mut ledger = self.ledger.write();
        let mut attempts = Vec::with_capacity(remaining.len());
        for tier in remaining {
            let attempt =
                self.attempt(&epochs, &mut ledger, submission, score, epoch, tier, timestamp)?;
            attempts.push(attempt);
        }

        let outcome = AllocationOutcome {
            submission_hash: hash,
            contributor: submission.contributor().to_string(),
            epoch,
            score,
            attempts,
        };
        tracing::info!(
            %hash,
            %epoch,
            successes = outcome.successes(),
            attempts = outcome.attempts.len(),
            reward = outcome.total_reward(),
            "Allocation completed"
        );
        Ok(outcome)
    }

    /// Attempt a single tier against an explicitly chosen epoch
    pub fn request_allocation(
        &self,
        hash: ContentHash,
        epoch: Epoch,
        tier: ContributionTier,
    ) -> Result<AllocationAttempt> {
        let timestamp = now_millis();
        let mut submissions = self.submissions.write();
        let submission = submissions
            .get_mut(&hash)
            .ok_or(ContractError::UnknownSubmission(hash))?;
        let (score, _) = approved_terms(submission)?;

        let epochs = self.epochs.read();
        let mut ledger = self.ledger.write();

        // a tier locked in the requested epoch is an availability outcome for any submission
        let quote = ledger.calculate_allocation(score, epoch, tier)?;
        if let Some(reason @ UnavailableReason::TierLocked { .. }) = quote.reason.clone() {
            tracing::debug!(%hash, %epoch, %tier, %reason, "Allocation unavailable");
            return Ok(AllocationAttempt::failed(&quote, reason, timestamp));
        }

        if !submission.tiers.contains(&tier) {
            return Err(ContractError::TierNotQualified { hash, tier });
        }
        if submission.allocated_tiers.contains(&tier) {
            return Err(ContractError::TierAlreadyAllocated { hash, tier });
        }
        self.attempt(&epochs, &mut ledger, submission, score, epoch, tier, timestamp)
    }

    #[allow(clippy::too_many_arguments)]
    fn attempt(
        &self,
        epochs: &EpochController,
        ledger: &mut TokenSupplyLedger,
        submission: &mut Submission,
        score: u32,
        epoch: Epoch,
        tier: ContributionTier,
        timestamp: i64,
    ) -> Result<AllocationAttempt> {
        let quote = ledger.calculate_allocation(score, epoch, tier)?;

        if self.policy == LockedEpochPolicy::Reject && !epochs.is_unlocked(epoch) {
            tracing::debug!(hash = %submission.hash, %epoch, %tier, "Epoch locked");
            return Ok(AllocationAttempt::failed(
                &quote,
                UnavailableReason::EpochLocked { epoch },
                timestamp,
            ));
        }
        if let Some(reason) = quote.reason.clone() {
            tracing::debug!(hash = %submission.hash, %epoch, %tier, %reason, "Allocation unavailable");
            return Ok(AllocationAttempt::failed(&quote, reason, timestamp));
        }

        let coherence = match (submission.usage_recorded, submission.evaluation) {
            (false, Some(evaluation)) => u64::from(evaluation.coherence),
            _ => 0,
        };
        let halvings_before = ledger.halving_count();
        let record = ledger.record_allocation(
            submission.hash,
            submission.contributor(),
            &quote,
            coherence,
            timestamp,
        )?;
        submission.usage_recorded = true;
        submission.allocated_tiers.push(tier);

        Ok(AllocationAttempt {
            tier,
            epoch,
            success: true,
            reason: None,
            reward: record.reward,
            balance_before: record.balance_before,
            balance_after: record.balance_after,
            halvings: ledger.halving_count() - halvings_before,
            timestamp,
        })
    }

    /// Quote without committing
    pub fn quote(&self, score: u32, epoch: Epoch, tier: ContributionTier) -> Result<AllocationQuote> {
        Ok(self.ledger.read().calculate_allocation(score, epoch, tier)?)
    }

    pub fn current_epoch(&self) -> Epoch {
        self.epochs.read().current()
    }

    pub fn is_epoch_unlocked(&self, epoch: Epoch) -> bool {
        self.epochs.read().is_unlocked(epoch)
    }

    /// Advance the global epoch by at most one step
    pub fn auto_advance(&self) -> Option<Epoch> {
        self.epochs.write().auto_advance()
    }

    pub fn advance(&self, epoch: Epoch) -> Result<()> {
        Ok(self.epochs.write().advance(epoch)?)
    }

    pub fn check_conservation(&self) -> Result<()> {
        Ok(self.ledger.read().check_conservation()?)
    }

    pub fn submission(&self, hash: &ContentHash) -> Option<Submission> {
        self.submissions.read().get(hash).cloned()
    }

    /// All submissions in arrival order
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.read().values().cloned().collect()
    }

    pub fn submissions_by(&self, contributor: &str) -> Vec<Submission> {
        self.submissions
            .read()
            .values()
            .filter(|s| s.contributor() == contributor)
            .cloned()
            .collect()
    }

    pub fn contributor(&self, id: &str) -> Option<ContributorSummary> {
        let ledger = self.ledger.read();
        let contributors = self.contributors.read();
        let activity = contributors.get(id)?.clone();
        Some(ContributorSummary {
            contributor: id.to_string(),
            activity,
            balance: ledger.contributor(id).cloned().unwrap_or_default(),
        })
    }

    /// Contributors ranked by total reward, ties by identifier
    pub fn top_contributors(&self, n: usize) -> Vec<ContributorSummary> {
        let ledger = self.ledger.read();
        let contributors = self.contributors.read();
        let mut summaries: Vec<ContributorSummary> = contributors
            .iter()
            .map(|(id, activity)| ContributorSummary {
                contributor: id.clone(),
                activity: activity.clone(),
                balance: ledger.contributor(id).cloned().unwrap_or_default(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.balance
                .total
                .cmp(&a.balance.total)
                .then_with(|| a.contributor.cmp(&b.contributor))
        });
        summaries.truncate(n);
        summaries
    }

    pub fn epoch_stats(&self) -> EpochStats {
        self.epochs.read().stats()
    }

    pub fn ledger_stats(&self) -> LedgerStats {
        self.ledger.read().stats()
    }

    pub fn stats(&self) -> ContractStats {
        let submissions = self.submissions.read();
        let epochs = self.epochs.read();
        let ledger = self.ledger.read();
        let contributors = self.contributors.read();

        let count = |status: SubmissionStatus| {
            submissions.values().filter(|s| s.status == status).count()
        };
        ContractStats {
            submissions: submissions.len(),
            pending: count(SubmissionStatus::Pending),
            approved: count(SubmissionStatus::Approved),
            rejected: count(SubmissionStatus::Rejected),
            fully_allocated: submissions.values().filter(|s| s.is_fully_allocated()).count(),
            contributors: contributors.len(),
            current_epoch: epochs.current(),
            progress: epochs.progress(),
            distributed: ledger.distributed(),
            remaining: ledger.remaining(),
            halving_count: ledger.halving_count(),
            policy: self.policy,
        }
    }

    /// Consistent view of epochs and ledger for the mirror layer
    pub fn reconciliation_snapshot(&self, chain_height: u64) -> ReconciliationSnapshot {
        let epochs = self.epochs.read();
        let ledger = self.ledger.read();
        ReconciliationSnapshot {
            epochs: epochs.clone(),
            ledger: ledger.clone(),
            chain_height,
            taken_at: now_millis(),
        }
    }

    /// Capture archive and ledger together
    pub fn export(&self) -> ContractExport {
        let submissions = self.submissions.read();
        let epochs = self.epochs.read();
        let ledger = self.ledger.read();
        let contributors = self.contributors.read();
        ContractExport {
            archive: ContractArchive {
                submissions: submissions.values().cloned().collect(),
                contributors: contributors.clone(),
                epochs: epochs.clone(),
                exported_at: now_millis(),
            },
            ledger: ledger.clone(),
        }
    }

    /// Rebuild a contract from persisted state, failing closed on any inconsistency
    pub fn restore(
        policy: LockedEpochPolicy,
        archive: ContractArchive,
        ledger: TokenSupplyLedger,
    ) -> Result<Self> {
        let ledger = TokenSupplyLedger::from_state(ledger)?;
        archive.epochs.validate_state()?;

        let mut submissions = IndexMap::with_capacity(archive.submissions.len());
        let mut activity: BTreeMap<String, ContributorActivity> = BTreeMap::new();
        for submission in archive.submissions {
            check_submission(&submission)?;
            let entry = activity.entry(submission.contributor().to_string()).or_default();
            entry.submissions += 1;
            match submission.status {
                SubmissionStatus::Approved => entry.approved += 1,
                SubmissionStatus::Rejected => entry.rejected += 1,
                SubmissionStatus::Pending => {}
            }
            let hash = submission.hash;
            if submissions.insert(hash, submission).is_some() {
                return Err(ContractError::InconsistentArchive(format!(
                    "duplicate submission {hash}"
                )));
            }
        }
        if activity != archive.contributors {
            return Err(ContractError::InconsistentArchive(
                "contributor counters do not match submissions".into(),
            ));
        }
        check_history(&submissions, &ledger)?;

        tracing::info!(
            submissions = submissions.len(),
            allocations = ledger.history().len(),
            epoch = %archive.epochs.current(),
            "Contract state restored"
        );
        Ok(Self {
            policy,
            submissions: RwLock::new(submissions),
            epochs: RwLock::new(archive.epochs),
            ledger: RwLock::new(ledger),
            contributors: RwLock::new(activity),
        })
    }
}

/// Score and qualified epoch of an approved submission
fn approved_terms(submission: &Submission) -> Result<(u32, Epoch)> {
    match (submission.status, submission.score, submission.qualified_epoch) {
        (SubmissionStatus::Approved, Some(score), Some(epoch)) => Ok((score, epoch)),
        (status, ..) => Err(ContractError::NotApproved {
            hash: submission.hash,
            status,
        }),
    }
}

fn check_submission(submission: &Submission) -> Result<()> {
    let hash = submission.hash;
    if submission.payload.content_hash() != hash {
        return Err(ContractError::InconsistentArchive(format!(
            "submission {hash} does not match its payload"
        )));
    }
    let consistent = match submission.status {
        SubmissionStatus::Pending => {
            submission.evaluation.is_none() && submission.allocated_tiers.is_empty()
        }
        SubmissionStatus::Rejected => {
            submission.evaluation.is_some() && submission.allocated_tiers.is_empty()
        }
        SubmissionStatus::Approved => {
            submission.evaluation.is_some()
                && submission.score.is_some()
                && submission.qualified_epoch.is_some()
        }
    };
    let tiers_valid = submission
        .allocated_tiers
        .iter()
        .all(|t| submission.tiers.contains(t));
    if !consistent || !tiers_valid {
        return Err(ContractError::InconsistentArchive(format!(
            "submission {hash} has inconsistent {} state",
            submission.status
        )));
    }
    Ok(())
}

/// Every ledger record maps to exactly one allocated tier of a known submission
fn check_history(
    submissions: &IndexMap<ContentHash, Submission>,
    ledger: &TokenSupplyLedger,
) -> Result<()> {
    let mut seen = HashSet::new();
    for record in ledger.history() {
        let allocated = submissions
            .get(&record.submission_hash)
            .map(|s| s.allocated_tiers.contains(&record.tier))
            .unwrap_or(false);
        if !allocated || !seen.insert((record.submission_hash, record.tier)) {
            return Err(ContractError::InconsistentArchive(format!(
                "allocation for {} ({}) has no matching submission tier",
                record.submission_hash, record.tier
            )));
        }
    }
    let allocated_total: usize = submissions.values().map(|s| s.allocated_tiers.len()).sum();
    if allocated_total != seen.len() {
        return Err(ContractError::InconsistentArchive(format!(
            "{allocated_total} allocated tiers but {} ledger records",
            seen.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> AllocationContract {
        AllocationContract::new(ContractConfig::default()).unwrap()
    }

    fn payload(content: &str, categories: &[&str]) -> SubmissionPayload {
        SubmissionPayload::new(
            "alice",
            content,
            categories.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["math"])).unwrap();
        assert_eq!(
            contract.submit(payload("x", &["math"])),
            Err(ContractError::DuplicateSubmission(hash))
        );
        assert_eq!(contract.stats().submissions, 1);
    }

    #[test]
    fn test_evaluation_only_once() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["math"])).unwrap();
        contract
            .record_evaluation(hash, Evaluation::approved(5000, 9000, 5000))
            .unwrap();
        assert!(matches!(
            contract.record_evaluation(hash, Evaluation::rejected()),
            Err(ContractError::NotPending { .. })
        ));
        assert_eq!(contract.epoch_stats().progress, 5000);
    }

    #[test]
    fn test_invalid_evaluation_no_mutation() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["math"])).unwrap();
        let result = contract.record_evaluation(hash, Evaluation::approved(10_001, 0, 0));
        assert!(matches!(result, Err(ContractError::InvalidEvaluation { .. })));
        assert_eq!(
            contract.submission(&hash).unwrap().status,
            SubmissionStatus::Pending
        );
    }

    #[test]
    fn test_rejected_cannot_allocate() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["math"])).unwrap();
        contract.record_evaluation(hash, Evaluation::rejected()).unwrap();
        assert_eq!(
            contract.allocate(hash),
            Err(ContractError::NotApproved {
                hash,
                status: SubmissionStatus::Rejected
            })
        );
    }

    #[test]
    fn test_fully_allocated() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["math"])).unwrap();
        contract
            .record_evaluation(hash, Evaluation::approved(9000, 9000, 9000))
            .unwrap();
        assert!(contract.allocate(hash).unwrap().any_success());
        assert_eq!(contract.allocate(hash), Err(ContractError::FullyAllocated(hash)));
    }

    #[test]
    fn test_request_allocation_checks_tier() {
        let contract = contract();
        let hash = contract.submit(payload("x", &["software"])).unwrap();
        contract
            .record_evaluation(hash, Evaluation::approved(9000, 9000, 9000))
            .unwrap();
        assert_eq!(
            contract.request_allocation(hash, Epoch::Growth, ContributionTier::Gold),
            Err(ContractError::TierNotQualified {
                hash,
                tier: ContributionTier::Gold
            })
        );
        let locked = contract
            .request_allocation(hash, Epoch::Founding, ContributionTier::Copper)
            .unwrap();
        assert!(!locked.success);
        assert_eq!(
            locked.reason,
            Some(UnavailableReason::TierLocked {
                tier: ContributionTier::Copper,
                epoch: Epoch::Founding
            })
        );
        let attempt = contract
            .request_allocation(hash, Epoch::Growth, ContributionTier::Silver)
            .unwrap();
        assert!(attempt.success);
        assert_eq!(
            contract.request_allocation(hash, Epoch::Growth, ContributionTier::Silver),
            Err(ContractError::TierAlreadyAllocated {
                hash,
                tier: ContributionTier::Silver
            })
        );
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Reject".parse::<LockedEpochPolicy>(), Ok(LockedEpochPolicy::Reject));
        assert!("maybe".parse::<LockedEpochPolicy>().is_err());
        assert_eq!(LockedEpochPolicy::default(), LockedEpochPolicy::Allow);
    }
}
