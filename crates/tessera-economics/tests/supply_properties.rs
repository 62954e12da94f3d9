//! Property tests for the token supply ledger and epoch controller

use proptest::prelude::*;
use tessera_core::ContentHash;
use tessera_economics::{
    ContributionTier, Epoch, EpochController, TokenSupplyLedger, TokenomicsParams,
    UnavailableReason, SCORE_SCALE,
};

fn arb_epoch() -> impl Strategy<Value = Epoch> {
    prop::sample::select(Epoch::ALL.to_vec())
}

fn arb_tier() -> impl Strategy<Value = ContributionTier> {
    prop::sample::select(ContributionTier::ALL.to_vec())
}

fn small_ledger() -> TokenSupplyLedger {
    TokenSupplyLedger::new(TokenomicsParams {
        total_supply: 5_000_000,
        base_reward_unit: 100,
        halving_unit: 20_000,
    })
    .unwrap()
}

fn hash_for(i: usize) -> ContentHash {
    tessera_core::hash::FieldHasher::new().u64(i as u64).finalize()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// Supply is conserved after any sequence of allocation attempts
    #[test]
    fn pbt_conservation_holds(
        ops in prop::collection::vec(
            (0u32..=SCORE_SCALE, arb_epoch(), arb_tier(), 0u64..=10_000),
            1..60,
        )
    ) {
        let mut ledger = small_ledger();
        for (i, (score, epoch, tier, coherence)) in ops.into_iter().enumerate() {
            let quote = ledger.calculate_allocation(score, epoch, tier).unwrap();
            let result = ledger.record_allocation(hash_for(i), "worker", &quote, coherence, i as i64);
            prop_assert_eq!(result.is_ok(), quote.available);
            prop_assert!(ledger.check_conservation().is_ok());
        }
        prop_assert!(ledger.validate_state().is_ok());
    }

    /// k crossings of the halving unit produce exactly k halvings
    #[test]
    fn pbt_halving_count_matches_crossings(
        coherences in prop::collection::vec(0u64..=10_000, 1..40)
    ) {
        let mut ledger = small_ledger();
        let unit = ledger.params().halving_unit;
        for (i, coherence) in coherences.into_iter().enumerate() {
            let old = ledger.usage_accumulator();
            let count = ledger.halving_count();
            let quote = ledger
                .calculate_allocation(1, Epoch::Abundance, ContributionTier::Gold)
                .unwrap();
            ledger.record_allocation(hash_for(i), "worker", &quote, coherence, 0).unwrap();

            let new = old + coherence;
            prop_assert_eq!(ledger.halving_count() - count, new / unit - old / unit);
        }
    }

    /// Availability follows the tier matrix and never mutates state
    #[test]
    fn pbt_tier_availability_is_pure(
        score in 1u32..=SCORE_SCALE,
        epoch in arb_epoch(),
        tier in arb_tier(),
    ) {
        let ledger = TokenSupplyLedger::default();
        let before = ledger.clone();
        let quote = ledger.calculate_allocation(score, epoch, tier).unwrap();
        prop_assert_eq!(ledger, before);

        let locked = matches!(quote.reason, Some(UnavailableReason::TierLocked { .. }));
        prop_assert_eq!(locked, !tier.is_available_in(epoch));
    }

    /// Progress never decreases and the current epoch only moves forward
    #[test]
    fn pbt_monotonic_progression(
        steps in prop::collection::vec((0u64..3_000_000, any::<bool>()), 1..30)
    ) {
        let mut ctl = EpochController::default();
        for (amount, try_advance) in steps {
            let (progress, current) = (ctl.progress(), ctl.current());
            ctl.record_progress(amount);
            if try_advance {
                ctl.auto_advance();
            }
            prop_assert!(ctl.progress() >= progress);
            prop_assert!(ctl.current() >= current);
            prop_assert!(ctl.current().index() <= current.index() + 1);
            prop_assert!(ctl.validate_state().is_ok());
        }
    }
}

#[test]
fn halving_drains_founding_into_growth() {
    let mut ledger = small_ledger();
    let founding = ledger.epoch_balance(Epoch::Founding);
    let growth = ledger.epoch_balance(Epoch::Growth);

    let quote = ledger
        .calculate_allocation(10_000, Epoch::Abundance, ContributionTier::Copper)
        .unwrap();
    ledger
        .record_allocation(hash_for(0), "worker", &quote, 60_000, 0)
        .unwrap();

    assert_eq!(ledger.halving_count(), 3);
    assert_eq!(ledger.epoch_balance(Epoch::Founding), founding / 2 / 2 / 2);
    assert_eq!(
        ledger.epoch_balance(Epoch::Growth),
        growth + founding - founding / 2 / 2 / 2
    );
    assert!(ledger.check_conservation().is_ok());
}
