//! # Tessera Economics - TSR Tokenomics
//!
//! Fixed-supply reward model for scored contributions.
//!
//! ## Key Features
//!
//! - **Fixed supply**: 1,000,000,000 TSR minted once and split across four epoch pools
//! - **Epoch progression**: pools unlock as cumulative network coherence grows
//! - **Metal tiers**: Gold, Silver and Copper contributions earn different multipliers
//! - **Usage-driven halving**: the scarcest pool halves each time usage crosses a unit
//!
//! ## Supply Split
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     TSR EPOCH POOLS (1B TSR)                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Founding:    400,000,000 TSR  (+ integer remainder)                    │
//! │  Growth:      300,000,000 TSR                                           │
//! │  Maturity:    200,000,000 TSR                                           │
//! │  Abundance:   100,000,000 TSR                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reward Formula
//!
//! | Term | Meaning |
//! |------|---------|
//! | score | composite score on 0..=10,000 |
//! | base | `BASE_REWARD_UNIT` (100 TSR) |
//! | multiplier | tier multiplier (1000 / 100 / 10) |
//! | reward | `score * base * multiplier / 10,000`, floored |

pub mod epoch;
pub mod error;
pub mod supply;
pub mod tier;

// Re-exports
pub use epoch::{Epoch, EpochController, EpochStats, EpochThresholds, EpochTransition};
pub use error::{EpochError, Result, TokenomicsError};
pub use supply::{
    AllocationQuote, AllocationRecord, ContributorBalance, HalvingEvent, LedgerStats,
    TokenSupplyLedger, TokenomicsParams, UnavailableReason,
};
pub use tier::ContributionTier;

/// TSR token constants
pub mod constants {
    /// Token symbol
    pub const SYMBOL: &str = "TSR";

    /// Token name
    pub const NAME: &str = "Tessera Reward Token";

    /// Decimal places
    pub const DECIMALS: u8 = 8;

    /// One TSR in base units
    pub const ONE_TSR: u128 = 100_000_000; // 10^8

    /// Fixed total supply: 1 billion TSR
    pub const TOTAL_SUPPLY: u128 = 1_000_000_000 * ONE_TSR;

    /// Reward for a perfect score at multiplier 1
    pub const BASE_REWARD_UNIT: u128 = 100 * ONE_TSR;

    /// Cumulative coherence per halving
    pub const HALVING_UNIT: u64 = 1_000_000;

    /// Upper bound of every score dimension
    pub const SCORE_SCALE: u32 = 10_000;

    /// Basis point denominator for pool shares
    pub const BPS_DENOMINATOR: u128 = 10_000;
}

pub use constants::*;

/// Format base units as a decimal TSR amount
pub fn format_tsr(amount: u128) -> String {
    let whole = amount / ONE_TSR;
    let frac = amount % ONE_TSR;
    if frac == 0 {
        format!("{whole} {SYMBOL}")
    } else {
        let digits = format!("{frac:08}");
        format!("{whole}.{} {SYMBOL}", digits.trim_end_matches('0'))
    }
}
