//! # Token Supply Ledger
//!
//! Owns the fixed TSR supply. The supply is split once into the four epoch
//! pools; rewards are drawn from a pool and credited to contributors. The
//! only write path is [`TokenSupplyLedger::record_allocation`].
//!
//! ## Halving on Usage
//!
//! Every allocation feeds the submission's coherence into a usage
//! accumulator. Each time the accumulator crosses a multiple of
//! `halving_unit`, the Founding pool is halved (floor) and the removed part
//! moves into the Growth pool:
//!
//! ```text
//! before:  Founding = F            Growth = G
//! after:   Founding = F / 2        Growth = G + (F - F / 2)
//! ```
//!
//! Supply is conserved at every step:
//! `Σ pool balances + Σ allocated rewards == total_supply`.

use crate::constants::{BASE_REWARD_UNIT, BPS_DENOMINATOR, HALVING_UNIT, SCORE_SCALE, TOTAL_SUPPLY};
use crate::epoch::Epoch;
use crate::error::{Result, TokenomicsError};
use crate::tier::ContributionTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tessera_core::ContentHash;

/// Supply parameters fixed at ledger creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenomicsParams {
    /// Total supply in base units
    pub total_supply: u128,
    /// Reward for a perfect score at multiplier 1, in base units
    pub base_reward_unit: u128,
    /// Cumulative coherence per halving
    pub halving_unit: u64,
}

impl TokenomicsParams {
    pub fn validate(&self) -> Result<()> {
        if self.total_supply == 0 {
            return Err(TokenomicsError::InvalidParams("total_supply must be positive".into()));
        }
        if self.base_reward_unit == 0 {
            return Err(TokenomicsError::InvalidParams(
                "base_reward_unit must be positive".into(),
            ));
        }
        if self.base_reward_unit > self.total_supply {
            return Err(TokenomicsError::InvalidParams(
                "base_reward_unit must not exceed total_supply".into(),
            ));
        }
        if self.halving_unit == 0 {
            return Err(TokenomicsError::InvalidParams("halving_unit must be positive".into()));
        }
        Ok(())
    }
}

impl Default for TokenomicsParams {
    fn default() -> Self {
        Self {
            total_supply: TOTAL_SUPPLY,
            base_reward_unit: BASE_REWARD_UNIT,
            halving_unit: HALVING_UNIT,
        }
    }
}

/// Why an allocation cannot proceed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Tier may not draw from this epoch's pool
    TierLocked { tier: ContributionTier, epoch: Epoch },
    /// Pool balance below the computed reward
    InsufficientBalance {
        epoch: Epoch,
        required: u128,
        remaining: u128,
    },
    /// Score yields no reward
    ZeroReward,
    /// Epoch not yet globally unlocked
    EpochLocked { epoch: Epoch },
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierLocked { tier, epoch } => {
                write!(f, "tier {tier} is not available in epoch {epoch}")
            }
            Self::InsufficientBalance {
                epoch,
                required,
                remaining,
            } => write!(
                f,
                "epoch {epoch} has {remaining} remaining, {required} required"
            ),
            Self::ZeroReward => f.write_str("score yields zero reward"),
            Self::EpochLocked { epoch } => write!(f, "epoch {epoch} is not unlocked"),
        }
    }
}

/// Result of a pure allocation check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationQuote {
    pub score: u32,
    pub epoch: Epoch,
    pub tier: ContributionTier,
    pub available: bool,
    pub reason: Option<UnavailableReason>,
    pub reward: u128,
    pub balance_before: u128,
    pub balance_after: u128,
}

/// Committed allocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub submission_hash: ContentHash,
    pub contributor: String,
    pub epoch: Epoch,
    pub tier: ContributionTier,
    pub score: u32,
    pub reward: u128,
    pub balance_before: u128,
    pub balance_after: u128,
    pub timestamp: i64,
}

/// Contributor balance with per-tier breakdown
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorBalance {
    pub total: u128,
    pub by_tier: BTreeMap<ContributionTier, u128>,
    pub allocations: u64,
}

/// Logged halving
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalvingEvent {
    pub sequence: u64,
    pub epoch: Epoch,
    pub balance_before: u128,
    pub balance_after: u128,
    pub carried_to: Option<Epoch>,
    pub accumulator: u64,
    pub timestamp: i64,
}

/// Ledger summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_supply: u128,
    pub distributed: u128,
    pub remaining: u128,
    pub epoch_balances: BTreeMap<Epoch, u128>,
    pub contributors: usize,
    pub allocations: usize,
    pub halving_count: u64,
    pub usage_accumulator: u64,
    pub next_halving_at: u64,
}

/// Rollback point for a single allocation
struct Checkpoint {
    epoch_balances: BTreeMap<Epoch, u128>,
    contributor: Option<ContributorBalance>,
    history_len: usize,
    halvings_len: usize,
    halving_count: u64,
    usage_accumulator: u64,
}

/// Fixed-supply ledger of epoch pools and contributor balances
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSupplyLedger {
    params: TokenomicsParams,
    epoch_balances: BTreeMap<Epoch, u128>,
    contributors: BTreeMap<String, ContributorBalance>,
    usage_accumulator: u64,
    halving_count: u64,
    halvings: Vec<HalvingEvent>,
    history: Vec<AllocationRecord>,
}

impl TokenSupplyLedger {
    /// Create a ledger with the supply split across epoch pools
    pub fn new(params: TokenomicsParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            epoch_balances: initial_split(params.total_supply),
            contributors: BTreeMap::new(),
            usage_accumulator: 0,
            halving_count: 0,
            halvings: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Reward for a score and tier: `score * base * multiplier / SCORE_SCALE`
    pub fn compute_reward(&self, score: u32, tier: ContributionTier) -> u128 {
        u128::from(score) * self.params.base_reward_unit * tier.multiplier()
            / u128::from(SCORE_SCALE)
    }

    /// Check an allocation without mutating anything
    ///
    /// Errors only on malformed input. Availability problems are reported in
    /// the quote's `reason`.
    pub fn calculate_allocation(
        &self,
        score: u32,
        epoch: Epoch,
        tier: ContributionTier,
    ) -> Result<AllocationQuote> {
        if score > SCORE_SCALE {
            return Err(TokenomicsError::InvalidScore {
                score,
                max: SCORE_SCALE,
            });
        }

        let reward = self.compute_reward(score, tier);
        let balance_before = self.epoch_balance(epoch);

        let reason = if !tier.is_available_in(epoch) {
            Some(UnavailableReason::TierLocked { tier, epoch })
        } else if reward == 0 {
            Some(UnavailableReason::ZeroReward)
        } else if reward > balance_before {
            Some(UnavailableReason::InsufficientBalance {
                epoch,
                required: reward,
                remaining: balance_before,
            })
        } else {
            None
        };

        let available = reason.is_none();
        let balance_after = if available {
            balance_before - reward
        } else {
            balance_before
        };

        tracing::debug!(score, %epoch, %tier, reward, available, "Allocation quoted");

        Ok(AllocationQuote {
            score,
            epoch,
            tier,
            available,
            reason,
            reward,
            balance_before,
            balance_after,
        })
    }

    /// Commit an allocation
    ///
    /// The quote is re-derived against current state; a quote that is
    /// unavailable or no longer matches is rejected without mutation.
    /// `coherence` is added to the usage accumulator and may trigger halvings.
    pub fn record_allocation(
        &mut self,
        submission_hash: ContentHash,
        contributor: &str,
        quote: &AllocationQuote,
        coherence: u64,
        timestamp: i64,
    ) -> Result<AllocationRecord> {
        if contributor.trim().is_empty() {
            return Err(TokenomicsError::InvalidContributor);
        }

        let fresh = self.calculate_allocation(quote.score, quote.epoch, quote.tier)?;
        if let Some(reason) = fresh.reason {
            return Err(TokenomicsError::Unavailable(reason));
        }
        if fresh.reward != quote.reward || fresh.balance_before != quote.balance_before {
            return Err(TokenomicsError::StaleQuote {
                epoch: quote.epoch,
                quoted: quote.balance_before,
                current: fresh.balance_before,
            });
        }

        let checkpoint = self.checkpoint(contributor);

        let pool = self.epoch_balances.entry(fresh.epoch).or_insert(0);
        *pool = pool
            .checked_sub(fresh.reward)
            .ok_or(TokenomicsError::Unavailable(
                UnavailableReason::InsufficientBalance {
                    epoch: fresh.epoch,
                    required: fresh.reward,
                    remaining: *pool,
                },
            ))?;

        let record = AllocationRecord {
            submission_hash,
            contributor: contributor.to_string(),
            epoch: fresh.epoch,
            tier: fresh.tier,
            score: fresh.score,
            reward: fresh.reward,
            balance_before: fresh.balance_before,
            balance_after: fresh.balance_after,
            timestamp,
        };
        self.history.push(record.clone());

        let balance = self.contributors.entry(contributor.to_string()).or_default();
        balance.total += fresh.reward;
        *balance.by_tier.entry(fresh.tier).or_insert(0) += fresh.reward;
        balance.allocations += 1;

        self.apply_usage(coherence, timestamp);

        if let Err(e) = self.check_conservation() {
            tracing::warn!(error = %e, %submission_hash, "Conservation check failed, rolling back");
            self.rollback(checkpoint, contributor);
            return Err(e);
        }

        tracing::info!(
            %submission_hash,
            contributor,
            epoch = %record.epoch,
            tier = %record.tier,
            reward = record.reward,
            "Allocation recorded"
        );
        Ok(record)
    }

    /// Feed usage and run any halvings it triggers
    fn apply_usage(&mut self, coherence: u64, timestamp: i64) -> u64 {
        let old = self.usage_accumulator;
        let new = old.saturating_add(coherence);
        let crossings = new / self.params.halving_unit - old / self.params.halving_unit;
        self.usage_accumulator = new;
        for _ in 0..crossings {
            self.halve(timestamp);
        }
        crossings
    }

    fn halve(&mut self, timestamp: i64) {
        let epoch = Epoch::Founding;
        let carried_to = epoch.next();
        let balance_before = self.epoch_balance(epoch);
        let balance_after = balance_before / 2;
        let removed = balance_before - balance_after;

        self.epoch_balances.insert(epoch, balance_after);
        if let Some(next) = carried_to {
            *self.epoch_balances.entry(next).or_insert(0) += removed;
        }
        self.halving_count += 1;
        self.halvings.push(HalvingEvent {
            sequence: self.halving_count,
            epoch,
            balance_before,
            balance_after,
            carried_to,
            accumulator: self.usage_accumulator,
            timestamp,
        });

        tracing::info!(
            sequence = self.halving_count,
            %epoch,
            balance_before,
            balance_after,
            "Halving applied"
        );
    }

    fn checkpoint(&self, contributor: &str) -> Checkpoint {
        Checkpoint {
            epoch_balances: self.epoch_balances.clone(),
            contributor: self.contributors.get(contributor).cloned(),
            history_len: self.history.len(),
            halvings_len: self.halvings.len(),
            halving_count: self.halving_count,
            usage_accumulator: self.usage_accumulator,
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint, contributor: &str) {
        self.epoch_balances = checkpoint.epoch_balances;
        match checkpoint.contributor {
            Some(balance) => {
                self.contributors.insert(contributor.to_string(), balance);
            }
            None => {
                self.contributors.remove(contributor);
            }
        }
        self.history.truncate(checkpoint.history_len);
        self.halvings.truncate(checkpoint.halvings_len);
        self.halving_count = checkpoint.halving_count;
        self.usage_accumulator = checkpoint.usage_accumulator;
    }

    /// Verify `Σ pool balances + Σ allocated == total_supply`
    pub fn check_conservation(&self) -> Result<()> {
        let actual = self.remaining() + self.distributed();
        if actual != self.params.total_supply {
            return Err(TokenomicsError::ConservationViolated {
                expected: self.params.total_supply,
                actual,
            });
        }
        Ok(())
    }

    /// Check a restored ledger against its invariants
    pub fn validate_state(&self) -> Result<()> {
        self.params.validate()?;

        for epoch in Epoch::ALL {
            if !self.epoch_balances.contains_key(&epoch) {
                return Err(TokenomicsError::InconsistentState(format!(
                    "missing balance for epoch {epoch}"
                )));
            }
        }
        self.check_conservation()?;

        let credited: u128 = self.contributors.values().map(|c| c.total).sum();
        if credited != self.distributed() {
            return Err(TokenomicsError::InconsistentState(format!(
                "contributors hold {credited}, history records {}",
                self.distributed()
            )));
        }
        for (id, balance) in &self.contributors {
            if balance.by_tier.values().sum::<u128>() != balance.total {
                return Err(TokenomicsError::InconsistentState(format!(
                    "tier breakdown of {id} does not sum to its total"
                )));
            }
        }

        let expected_halvings = self.usage_accumulator / self.params.halving_unit;
        if self.halving_count != expected_halvings || self.halvings.len() as u64 != self.halving_count
        {
            return Err(TokenomicsError::InconsistentState(format!(
                "halving count {} does not match accumulator {}",
                self.halving_count, self.usage_accumulator
            )));
        }
        Ok(())
    }

    /// Accept a deserialized ledger only if it is internally consistent
    pub fn from_state(state: Self) -> Result<Self> {
        if let Err(e) = state.validate_state() {
            tracing::warn!(error = %e, "Rejected ledger state");
            return Err(e);
        }
        Ok(state)
    }

    pub fn params(&self) -> &TokenomicsParams {
        &self.params
    }

    pub fn epoch_balance(&self, epoch: Epoch) -> u128 {
        self.epoch_balances.get(&epoch).copied().unwrap_or(0)
    }

    pub fn epoch_balances(&self) -> &BTreeMap<Epoch, u128> {
        &self.epoch_balances
    }

    /// Sum of all pool balances
    pub fn remaining(&self) -> u128 {
        self.epoch_balances.values().sum()
    }

    /// Sum of all allocated rewards
    pub fn distributed(&self) -> u128 {
        self.history.iter().map(|r| r.reward).sum()
    }

    pub fn contributor(&self, id: &str) -> Option<&ContributorBalance> {
        self.contributors.get(id)
    }

    pub fn contributors(&self) -> impl Iterator<Item = (&str, &ContributorBalance)> {
        self.contributors.iter().map(|(id, b)| (id.as_str(), b))
    }

    pub fn history(&self) -> &[AllocationRecord] {
        &self.history
    }

    pub fn halvings(&self) -> &[HalvingEvent] {
        &self.halvings
    }

    pub fn halving_count(&self) -> u64 {
        self.halving_count
    }

    pub fn usage_accumulator(&self) -> u64 {
        self.usage_accumulator
    }

    pub fn stats(&self) -> LedgerStats {
        let distributed = self.distributed();
        let unit = self.params.halving_unit;
        LedgerStats {
            total_supply: self.params.total_supply,
            distributed,
            remaining: self.remaining(),
            epoch_balances: self.epoch_balances.clone(),
            contributors: self.contributors.len(),
            allocations: self.history.len(),
            halving_count: self.halving_count,
            usage_accumulator: self.usage_accumulator,
            next_halving_at: (self.usage_accumulator / unit).saturating_add(1).saturating_mul(unit),
        }
    }
}

impl Default for TokenSupplyLedger {
    fn default() -> Self {
        let params = TokenomicsParams::default();
        Self {
            params,
            epoch_balances: initial_split(params.total_supply),
            contributors: BTreeMap::new(),
            usage_accumulator: 0,
            halving_count: 0,
            halvings: Vec::new(),
            history: Vec::new(),
        }
    }
}

/// Split supply by epoch shares; the remainder goes to Founding
fn initial_split(total_supply: u128) -> BTreeMap<Epoch, u128> {
    let mut balances: BTreeMap<Epoch, u128> = Epoch::ALL
        .iter()
        .map(|e| (*e, total_supply * u128::from(e.supply_share_bps()) / BPS_DENOMINATOR))
        .collect();
    let assigned: u128 = balances.values().sum();
    if let Some(founding) = balances.get_mut(&Epoch::Founding) {
        *founding += total_supply - assigned;
    }
    balances
}
