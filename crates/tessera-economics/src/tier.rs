//! # Contribution Tiers
//!
//! Metal ranks that scale rewards and gate which epoch pools a contribution
//! may draw from.
//!
//! | Tier | Multiplier | Available from |
//! |------|-----------:|----------------|
//! | Gold | ×1000 | Founding |
//! | Silver | ×100 | Growth |
//! | Copper | ×10 | Maturity |

use crate::epoch::Epoch;
use crate::error::TokenomicsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Contribution tier, ordered highest rank first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionTier {
    /// Gold: scientific contributions
    Gold,
    /// Silver: engineering contributions
    Silver,
    /// Copper: everything else
    Copper,
}

impl ContributionTier {
    /// All tiers, highest rank first
    pub const ALL: [ContributionTier; 3] = [Self::Gold, Self::Silver, Self::Copper];

    /// Get reward multiplier for tier
    pub fn multiplier(&self) -> u128 {
        match self {
            Self::Gold => 1000,
            Self::Silver => 100,
            Self::Copper => 10,
        }
    }

    /// Earliest epoch whose pool this tier may draw from
    pub fn first_available_epoch(&self) -> Epoch {
        match self {
            Self::Gold => Epoch::Founding,
            Self::Silver => Epoch::Growth,
            Self::Copper => Epoch::Maturity,
        }
    }

    /// Availability matrix lookup
    pub fn is_available_in(&self, epoch: Epoch) -> bool {
        epoch >= self.first_available_epoch()
    }

    /// Get tier name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Copper => "copper",
        }
    }
}

impl fmt::Display for ContributionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContributionTier {
    type Err = TokenomicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            "copper" => Ok(Self::Copper),
            _ => Err(TokenomicsError::UnknownTier(s.to_string())),
        }
    }
}
