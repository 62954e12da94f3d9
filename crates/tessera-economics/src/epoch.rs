//! # Epoch Progression
//!
//! Four ordered epochs from most scarce to most abundant. The controller
//! tracks cumulative network progress and unlocks epochs strictly in order.
//!
//! | Epoch | Pool Share | Unlock Progress | Qualification Density |
//! |-------|-----------:|----------------:|----------------------:|
//! | Founding | 40% | 0 | ≥ 8000 |
//! | Growth | 30% | 500,000 | ≥ 6000 |
//! | Maturity | 20% | 2,000,000 | ≥ 4000 |
//! | Abundance | 10% | 8,000,000 | ≥ 0 |
//!
//! Per-submission qualification (by density) is independent from the global
//! unlock state held here.

use crate::error::EpochError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tessera_core::now_millis;

/// Reward epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Epoch {
    /// Founding: scarcest pool
    Founding,
    /// Growth
    Growth,
    /// Maturity
    Maturity,
    /// Abundance: terminal epoch
    Abundance,
}

impl Epoch {
    /// All epochs in progression order
    pub const ALL: [Epoch; 4] = [Self::Founding, Self::Growth, Self::Maturity, Self::Abundance];

    /// Position in the progression
    pub fn index(&self) -> usize {
        match self {
            Self::Founding => 0,
            Self::Growth => 1,
            Self::Maturity => 2,
            Self::Abundance => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Immediate successor, `None` for the terminal epoch
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Share of total supply in basis points
    pub fn supply_share_bps(&self) -> u32 {
        match self {
            Self::Founding => 4000,
            Self::Growth => 3000,
            Self::Maturity => 2000,
            Self::Abundance => 1000,
        }
    }

    /// Default cumulative progress needed to unlock
    pub fn default_unlock_threshold(&self) -> u64 {
        match self {
            Self::Founding => 0,
            Self::Growth => 500_000,
            Self::Maturity => 2_000_000,
            Self::Abundance => 8_000_000,
        }
    }

    /// Minimum density for a submission to qualify for this epoch
    pub fn qualification_density(&self) -> u32 {
        match self {
            Self::Founding => 8000,
            Self::Growth => 6000,
            Self::Maturity => 4000,
            Self::Abundance => 0,
        }
    }

    /// Get epoch name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Founding => "founding",
            Self::Growth => "growth",
            Self::Maturity => "maturity",
            Self::Abundance => "abundance",
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Epoch {
    type Err = EpochError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "founding" => Ok(Self::Founding),
            "growth" => Ok(Self::Growth),
            "maturity" => Ok(Self::Maturity),
            "abundance" => Ok(Self::Abundance),
            _ => Err(EpochError::UnknownEpoch(s.to_string())),
        }
    }
}

/// Unlock thresholds, one per epoch in progression order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochThresholds([u64; 4]);

impl EpochThresholds {
    /// Validated thresholds: first is zero, the rest strictly increasing
    pub fn new(thresholds: [u64; 4]) -> Result<Self, EpochError> {
        if thresholds[0] != 0 {
            return Err(EpochError::InvalidThresholds(format!(
                "founding threshold must be 0, got {}",
                thresholds[0]
            )));
        }
        for pair in thresholds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(EpochError::InvalidThresholds(format!(
                    "thresholds must be strictly increasing: {:?}",
                    thresholds
                )));
            }
        }
        Ok(Self(thresholds))
    }

    pub fn get(&self, epoch: Epoch) -> u64 {
        self.0[epoch.index()]
    }

    pub fn as_array(&self) -> [u64; 4] {
        self.0
    }
}

impl Default for EpochThresholds {
    fn default() -> Self {
        Self(Epoch::ALL.map(|e| e.default_unlock_threshold()))
    }
}

/// Logged epoch transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTransition {
    pub from: Epoch,
    pub to: Epoch,
    pub progress: u64,
    pub timestamp: i64,
}

/// Controller summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochStats {
    pub current: Epoch,
    pub progress: u64,
    pub unlocked: Vec<Epoch>,
    pub next: Option<Epoch>,
    pub next_threshold: Option<u64>,
    pub remaining_to_next: Option<u64>,
    pub transitions: usize,
}

/// Global epoch state machine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochController {
    current: Epoch,
    unlocked: BTreeMap<Epoch, bool>,
    progress: u64,
    thresholds: EpochThresholds,
    transitions: Vec<EpochTransition>,
}

impl EpochController {
    /// Start in Founding with only Founding unlocked
    pub fn new(thresholds: EpochThresholds) -> Self {
        let unlocked = Epoch::ALL
            .iter()
            .map(|e| (*e, *e == Epoch::Founding))
            .collect();
        Self {
            current: Epoch::Founding,
            unlocked,
            progress: 0,
            thresholds,
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> Epoch {
        self.current
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn thresholds(&self) -> &EpochThresholds {
        &self.thresholds
    }

    pub fn transitions(&self) -> &[EpochTransition] {
        &self.transitions
    }

    pub fn is_unlocked(&self, epoch: Epoch) -> bool {
        self.unlocked.get(&epoch).copied().unwrap_or(false)
    }

    /// Add progress, saturating at `u64::MAX`
    pub fn record_progress(&mut self, amount: u64) {
        self.progress = self.progress.saturating_add(amount);
    }

    /// Whether progress has reached the epoch's threshold
    pub fn can_unlock(&self, epoch: Epoch) -> bool {
        self.progress >= self.thresholds.get(epoch)
    }

    /// Successor of the current epoch if it can unlock now
    pub fn check_transition(&self) -> Option<Epoch> {
        self.current.next().filter(|next| self.can_unlock(*next))
    }

    /// Move to `epoch`, which must be the unlockable immediate successor
    pub fn advance(&mut self, epoch: Epoch) -> Result<(), EpochError> {
        self.advance_at(epoch, now_millis())
    }

    /// Like [`advance`](Self::advance) with an explicit timestamp
    pub fn advance_at(&mut self, epoch: Epoch, timestamp: i64) -> Result<(), EpochError> {
        let expected = self
            .current
            .next()
            .ok_or(EpochError::TerminalEpoch(self.current))?;
        if epoch != expected {
            return Err(EpochError::NotImmediateSuccessor {
                current: self.current,
                requested: epoch,
            });
        }
        if !self.can_unlock(epoch) {
            return Err(EpochError::ThresholdNotMet {
                epoch,
                required: self.thresholds.get(epoch),
                progress: self.progress,
            });
        }

        let from = self.current;
        self.unlocked.insert(epoch, true);
        self.current = epoch;
        self.transitions.push(EpochTransition {
            from,
            to: epoch,
            progress: self.progress,
            timestamp,
        });
        tracing::info!(%from, to = %epoch, progress = self.progress, "Epoch advanced");
        Ok(())
    }

    /// Advance at most one step if the successor can unlock
    pub fn auto_advance(&mut self) -> Option<Epoch> {
        let next = self.check_transition()?;
        self.advance(next).ok().map(|_| next)
    }

    pub fn stats(&self) -> EpochStats {
        let next = self.current.next();
        let next_threshold = next.map(|e| self.thresholds.get(e));
        EpochStats {
            current: self.current,
            progress: self.progress,
            unlocked: Epoch::ALL
                .iter()
                .copied()
                .filter(|e| self.is_unlocked(*e))
                .collect(),
            next,
            next_threshold,
            remaining_to_next: next_threshold.map(|t| t.saturating_sub(self.progress)),
            transitions: self.transitions.len(),
        }
    }

    /// Check a restored controller against its invariants
    pub fn validate_state(&self) -> Result<(), EpochError> {
        EpochThresholds::new(self.thresholds.0)?;

        for epoch in Epoch::ALL {
            let unlocked = self.is_unlocked(epoch);
            let expected = epoch <= self.current;
            if unlocked != expected {
                return Err(EpochError::InconsistentState(format!(
                    "epoch {epoch} unlocked={unlocked} with current {}",
                    self.current
                )));
            }
        }
        if self.transitions.len() != self.current.index() {
            return Err(EpochError::InconsistentState(format!(
                "{} transitions recorded for current epoch {}",
                self.transitions.len(),
                self.current
            )));
        }
        for (i, t) in self.transitions.iter().enumerate() {
            if t.from.index() != i || t.to.index() != i + 1 || t.progress > self.progress {
                return Err(EpochError::InconsistentState(format!(
                    "transition {i} ({} -> {}) out of order",
                    t.from, t.to
                )));
            }
        }
        if !self.can_unlock(self.current) {
            return Err(EpochError::InconsistentState(format!(
                "progress {} below threshold of current epoch {}",
                self.progress, self.current
            )));
        }
        Ok(())
    }
}

impl Default for EpochController {
    fn default() -> Self {
        Self::new(EpochThresholds::default())
    }
}
