//! Dual-layer mirror
//!
//! A provisional copy of epoch and ledger state for fast previews. The mirror
//! is refreshed only by [`MirrorLayer::sync_from_canonical`]; provisional
//! allocations recorded here never reach the canonical contract. Divergence
//! is reported by [`MirrorLayer::matches`] but never corrected automatically.

use crate::error::Result;
use crate::evaluator::Evaluation;
use crate::score::{evaluation_score, qualify_epoch};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tessera_core::{now_millis, ContentHash};
use tessera_economics::{
    AllocationQuote, AllocationRecord, ContributionTier, Epoch, EpochController, LedgerStats,
    TokenSupplyLedger,
};

/// Canonical state handed to the mirror
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSnapshot {
    pub epochs: EpochController,
    pub ledger: TokenSupplyLedger,
    pub chain_height: u64,
    pub taken_at: i64,
}

#[derive(Default)]
struct MirrorState {
    epochs: EpochController,
    ledger: TokenSupplyLedger,
    chain_height: u64,
    synced_at: Option<i64>,
    provisional: Vec<AllocationRecord>,
}

/// Provisional mirror of canonical tokenomics state
#[derive(Default)]
pub struct MirrorLayer {
    state: RwLock<MirrorState>,
}

impl MirrorLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mirror state, dropping provisional records
    pub fn sync_from_canonical(&self, snapshot: &ReconciliationSnapshot) {
        let mut state = self.state.write();
        let dropped = state.provisional.len();
        *state = MirrorState {
            epochs: snapshot.epochs.clone(),
            ledger: snapshot.ledger.clone(),
            chain_height: snapshot.chain_height,
            synced_at: Some(now_millis()),
            provisional: Vec::new(),
        };
        tracing::debug!(
            chain_height = snapshot.chain_height,
            dropped_provisional = dropped,
            "Mirror synced from canonical"
        );
    }

    /// Quote against mirror balances
    pub fn preview(&self, score: u32, epoch: Epoch, tier: ContributionTier) -> Result<AllocationQuote> {
        Ok(self.state.read().ledger.calculate_allocation(score, epoch, tier)?)
    }

    /// Quotes an evaluation would receive for each tier
    ///
    /// Rejected evaluations yield no quotes.
    pub fn preview_evaluation(
        &self,
        evaluation: &Evaluation,
        tiers: &[ContributionTier],
    ) -> Result<Vec<AllocationQuote>> {
        evaluation.validate()?;
        if !evaluation.is_approved() {
            return Ok(Vec::new());
        }
        let score = evaluation_score(evaluation);
        let epoch = qualify_epoch(evaluation.density);

        let state = self.state.read();
        let mut quotes = Vec::with_capacity(tiers.len());
        for tier in tiers {
            quotes.push(state.ledger.calculate_allocation(score, epoch, *tier)?);
        }
        Ok(quotes)
    }

    /// Commit an allocation to the mirror only
    pub fn record_provisional(
        &self,
        submission_hash: ContentHash,
        contributor: &str,
        quote: &AllocationQuote,
        coherence: u64,
    ) -> Result<AllocationRecord> {
        let mut state = self.state.write();
        let record = state.ledger.record_allocation(
            submission_hash,
            contributor,
            quote,
            coherence,
            now_millis(),
        )?;
        state.provisional.push(record.clone());
        Ok(record)
    }

    /// Bit-exact comparison of epochs, ledger and chain height
    pub fn matches(&self, snapshot: &ReconciliationSnapshot) -> bool {
        let state = self.state.read();
        state.chain_height == snapshot.chain_height
            && state.epochs == snapshot.epochs
            && state.ledger == snapshot.ledger
    }

    pub fn is_synced(&self) -> bool {
        self.state.read().synced_at.is_some()
    }

    pub fn synced_at(&self) -> Option<i64> {
        self.state.read().synced_at
    }

    pub fn chain_height(&self) -> u64 {
        self.state.read().chain_height
    }

    pub fn current_epoch(&self) -> Epoch {
        self.state.read().epochs.current()
    }

    pub fn ledger_stats(&self) -> LedgerStats {
        self.state.read().ledger.stats()
    }

    /// Provisional records since the last sync
    pub fn provisional(&self) -> Vec<AllocationRecord> {
        self.state.read().provisional.clone()
    }
}
