//! End-to-end allocation scenarios against the canonical contract

use std::sync::Arc;
use std::thread;
use tessera_contract::{
    AllocationContract, ContractArchive, ContractConfig, ContractError, Evaluation,
    LockedEpochPolicy, SubmissionPayload, SubmissionStatus,
};
use tessera_economics::{
    ContributionTier, Epoch, EpochThresholds, TokenSupplyLedger, TokenomicsParams,
    UnavailableReason, BASE_REWARD_UNIT,
};

fn contract_with(policy: LockedEpochPolicy) -> AllocationContract {
    AllocationContract::new(ContractConfig {
        locked_epoch_policy: policy,
        ..ContractConfig::default()
    })
    .unwrap()
}

fn payload(contributor: &str, content: &str, categories: &[&str]) -> SubmissionPayload {
    SubmissionPayload::new(
        contributor,
        content,
        categories.iter().map(|c| c.to_string()).collect(),
    )
}

#[test]
fn scenario_scientific_founding_gold() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let founding_before = contract.ledger_stats().epoch_balances[&Epoch::Founding];

    let hash = contract
        .submit(payload("alice", "a proof of the lemma", &["scientific"]))
        .unwrap();
    let submission = contract
        .record_evaluation(hash, Evaluation::approved(8500, 9000, 8000))
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Approved);
    assert_eq!(submission.score, Some(6120));
    assert_eq!(submission.qualified_epoch, Some(Epoch::Founding));
    assert_eq!(submission.tier, ContributionTier::Gold);

    let outcome = contract.allocate(hash).unwrap();
    let expected = 6120 * BASE_REWARD_UNIT * 1000 / 10_000;
    assert_eq!(outcome.attempts.len(), 1);
    assert!(outcome.attempts[0].success);
    assert_eq!(outcome.total_reward(), expected);

    let founding_after = contract.ledger_stats().epoch_balances[&Epoch::Founding];
    assert_eq!(founding_before - founding_after, expected);
    assert_eq!(contract.contributor("alice").unwrap().balance.total, expected);
    assert!(contract.check_conservation().is_ok());
}

#[test]
fn scenario_maturity_copper_against_founding() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let hash = contract
        .submit(payload("bob", "field notes", &["scientific"]))
        .unwrap();
    let submission = contract
        .record_evaluation(hash, Evaluation::approved(7000, 4500, 7000))
        .unwrap();
    assert_eq!(submission.qualified_epoch, Some(Epoch::Maturity));

    let before = contract.ledger_stats();
    let attempt = contract
        .request_allocation(hash, Epoch::Founding, ContributionTier::Copper)
        .unwrap();
    assert!(!attempt.success);
    assert_eq!(
        attempt.reason,
        Some(UnavailableReason::TierLocked {
            tier: ContributionTier::Copper,
            epoch: Epoch::Founding,
        })
    );
    assert_eq!(contract.ledger_stats(), before);

    // its own tier against the qualified epoch still succeeds
    let outcome = contract.allocate(hash).unwrap();
    assert_eq!(outcome.epoch, Epoch::Maturity);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].tier, ContributionTier::Gold);
    assert!(outcome.attempts[0].success);
}

#[test]
fn locked_epoch_policy_allow_draws_from_locked_pool() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let hash = contract.submit(payload("carol", "patch", &["alignment"])).unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(5000, 4500, 5000))
        .unwrap();
    assert!(!contract.is_epoch_unlocked(Epoch::Maturity));

    let outcome = contract.allocate(hash).unwrap();
    assert!(outcome.any_success());
}

#[test]
fn locked_epoch_policy_reject_fails_attempt() {
    let contract = contract_with(LockedEpochPolicy::Reject);
    let hash = contract.submit(payload("carol", "patch", &["alignment"])).unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(5000, 4500, 5000))
        .unwrap();

    let before = contract.ledger_stats();
    let outcome = contract.allocate(hash).unwrap();
    assert!(!outcome.any_success());
    assert_eq!(
        outcome.attempts[0].reason,
        Some(UnavailableReason::EpochLocked {
            epoch: Epoch::Maturity
        })
    );
    assert_eq!(contract.ledger_stats(), before);

    // founding is unlocked from the start, so gold still allocates there
    let gold = contract.submit(payload("dave", "theorem", &["math"])).unwrap();
    contract
        .record_evaluation(gold, Evaluation::approved(9000, 9000, 9000))
        .unwrap();
    assert!(contract.allocate(gold).unwrap().any_success());
}

#[test]
fn multiple_tiers_succeed_independently() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let hash = contract
        .submit(payload("erin", "a measured result", &["physics", "alignment"]))
        .unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(9000, 9000, 9000))
        .unwrap();

    let outcome = contract.allocate(hash).unwrap();
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].tier, ContributionTier::Gold);
    assert!(outcome.attempts[0].success);
    assert_eq!(outcome.attempts[1].tier, ContributionTier::Copper);
    assert!(!outcome.attempts[1].success);

    let submission = contract.submission(&hash).unwrap();
    assert_eq!(submission.allocated_tiers, vec![ContributionTier::Gold]);
    assert_eq!(submission.remaining_tiers(), vec![ContributionTier::Copper]);

    // the failed tier may be retried, the allocated one is not repeated
    let retry = contract.allocate(hash).unwrap();
    assert_eq!(retry.attempts.len(), 1);
    assert_eq!(retry.attempts[0].tier, ContributionTier::Copper);
}

#[test]
fn coherence_feeds_halving_once_per_submission() {
    let contract = AllocationContract::new(ContractConfig {
        tokenomics: TokenomicsParams {
            halving_unit: 10_000,
            ..TokenomicsParams::default()
        },
        ..ContractConfig::default()
    })
    .unwrap();

    let hash = contract
        .submit(payload("frank", "compiler pass", &["math", "software"]))
        .unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(6000, 6500, 6000))
        .unwrap();

    let outcome = contract.allocate(hash).unwrap();
    assert_eq!(outcome.successes(), 2);
    let stats = contract.ledger_stats();
    assert_eq!(stats.usage_accumulator, 6000);
    assert_eq!(stats.halving_count, 0);

    let second = contract
        .submit(payload("frank", "second pass", &["math"]))
        .unwrap();
    contract
        .record_evaluation(second, Evaluation::approved(6000, 6500, 6000))
        .unwrap();
    let outcome = contract.allocate(second).unwrap();
    assert_eq!(outcome.attempts[0].halvings, 1);
    assert_eq!(contract.ledger_stats().halving_count, 1);
    assert!(contract.check_conservation().is_ok());
}

#[test]
fn epoch_progress_follows_approved_coherence() {
    let contract = AllocationContract::new(ContractConfig {
        thresholds: EpochThresholds::new([0, 10_000, 20_000, 30_000]).unwrap(),
        ..ContractConfig::default()
    })
    .unwrap();

    for i in 0..3 {
        let hash = contract
            .submit(payload("gina", &format!("entry {i}"), &["research"]))
            .unwrap();
        contract
            .record_evaluation(hash, Evaluation::approved(9000, 9000, 9000))
            .unwrap();
    }
    let rejected = contract.submit(payload("gina", "spam", &[])).unwrap();
    contract
        .record_evaluation(rejected, Evaluation::rejected())
        .unwrap();

    assert_eq!(contract.epoch_stats().progress, 27_000);
    assert_eq!(contract.auto_advance(), Some(Epoch::Growth));
    assert_eq!(contract.auto_advance(), Some(Epoch::Maturity));
    assert_eq!(contract.auto_advance(), None);

    let summary = contract.contributor("gina").unwrap();
    assert_eq!(summary.activity.submissions, 4);
    assert_eq!(summary.activity.approved, 3);
    assert_eq!(summary.activity.rejected, 1);
}

#[test]
fn evaluator_errors_leave_submission_pending() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let hash = contract.submit(payload("hal", "draft", &["systems"])).unwrap();

    let failing = |_: &SubmissionPayload| -> tessera_contract::Result<Evaluation> {
        Err(ContractError::Evaluator("model unavailable".into()))
    };
    let err = contract.evaluate_with(hash, &failing).unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(
        contract.submission(&hash).unwrap().status,
        SubmissionStatus::Pending
    );

    let approving = |p: &SubmissionPayload| -> tessera_contract::Result<Evaluation> {
        Ok(Evaluation::approved(7000, 6500, p.content.len() as u32 * 1000))
    };
    let submission = contract.evaluate_with(hash, &approving).unwrap();
    assert_eq!(submission.qualified_epoch, Some(Epoch::Growth));
}

#[test]
fn top_contributors_ranked_by_reward() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    for (who, novelty) in [("ivy", 9000), ("jon", 5000), ("kim", 7000)] {
        let hash = contract
            .submit(payload(who, &format!("work by {who}"), &["biology"]))
            .unwrap();
        contract
            .record_evaluation(hash, Evaluation::approved(9000, 9000, novelty))
            .unwrap();
        contract.allocate(hash).unwrap();
    }

    let top: Vec<String> = contract
        .top_contributors(2)
        .into_iter()
        .map(|s| s.contributor)
        .collect();
    assert_eq!(top, vec!["ivy".to_string(), "kim".to_string()]);
}

#[test]
fn archive_restore_roundtrip_and_tamper() {
    let contract = contract_with(LockedEpochPolicy::Allow);
    let hash = contract.submit(payload("lea", "dataset", &["chemistry"])).unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(8000, 8000, 8000))
        .unwrap();
    contract.allocate(hash).unwrap();
    contract.submit(payload("lea", "follow-up", &["hardware"])).unwrap();

    let export = contract.export();
    let archive_json = serde_json::to_string(&export.archive).unwrap();
    let ledger_json = serde_json::to_string(&export.ledger).unwrap();

    let archive: ContractArchive = serde_json::from_str(&archive_json).unwrap();
    let ledger: TokenSupplyLedger = serde_json::from_str(&ledger_json).unwrap();
    let restored = AllocationContract::restore(LockedEpochPolicy::Allow, archive, ledger).unwrap();
    assert_eq!(restored.stats(), contract.stats());
    assert_eq!(restored.submission(&hash), contract.submission(&hash));
    let by_lea: Vec<_> = restored
        .submissions_by("lea")
        .into_iter()
        .map(|s| s.status)
        .collect();
    assert_eq!(by_lea, vec![SubmissionStatus::Approved, SubmissionStatus::Pending]);
    assert!(restored.submissions_by("nobody").is_empty());

    // dropping an allocated submission orphans its ledger record
    let mut archive: ContractArchive = serde_json::from_str(&archive_json).unwrap();
    archive.submissions.remove(0);
    archive.contributors.get_mut("lea").unwrap().submissions -= 1;
    archive.contributors.get_mut("lea").unwrap().approved -= 1;
    let ledger: TokenSupplyLedger = serde_json::from_str(&ledger_json).unwrap();
    assert!(matches!(
        AllocationContract::restore(LockedEpochPolicy::Allow, archive, ledger),
        Err(ContractError::InconsistentArchive(_))
    ));
}

#[test]
fn concurrent_allocations_conserve_supply() {
    let contract = Arc::new(contract_with(LockedEpochPolicy::Allow));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let contract = Arc::clone(&contract);
            thread::spawn(move || {
                for i in 0..10 {
                    let hash = contract
                        .submit(payload(
                            &format!("worker-{t}"),
                            &format!("item {i}"),
                            &["physics", "software"],
                        ))
                        .unwrap();
                    contract
                        .record_evaluation(hash, Evaluation::approved(7000, 6500, 8000))
                        .unwrap();
                    contract.allocate(hash).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = contract.stats();
    assert_eq!(stats.submissions, 80);
    assert_eq!(stats.fully_allocated, 80);
    assert_eq!(contract.ledger_stats().allocations, 160);
    assert!(contract.check_conservation().is_ok());
}
