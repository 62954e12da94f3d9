//! Category to tier mapping
//!
//! Closed, exact-label table applied after trimming and lowercasing. Labels
//! not listed fall through to Copper.
//!
//! | Labels | Tier |
//! |--------|------|
//! | science, scientific, research, physics, mathematics, math, biology, chemistry | Gold |
//! | engineering, software, hardware, infrastructure, systems | Silver |
//! | alignment, anything else | Copper |

use tessera_economics::ContributionTier;

const GOLD_LABELS: &[&str] = &[
    "science",
    "scientific",
    "research",
    "physics",
    "mathematics",
    "math",
    "biology",
    "chemistry",
];

const SILVER_LABELS: &[&str] = &[
    "engineering",
    "software",
    "hardware",
    "infrastructure",
    "systems",
];

/// Tier for a single category label
pub fn tier_for_category(category: &str) -> ContributionTier {
    let label = category.trim().to_lowercase();
    if GOLD_LABELS.contains(&label.as_str()) {
        ContributionTier::Gold
    } else if SILVER_LABELS.contains(&label.as_str()) {
        ContributionTier::Silver
    } else {
        ContributionTier::Copper
    }
}

/// Primary tier and the distinct qualifying tiers, highest first
///
/// The primary tier is the first category's tier. No categories yields Copper.
pub fn tiers_for_categories(categories: &[String]) -> (ContributionTier, Vec<ContributionTier>) {
    let mut tiers: Vec<ContributionTier> = categories.iter().map(|c| tier_for_category(c)).collect();
    let primary = tiers.first().copied().unwrap_or(ContributionTier::Copper);
    if tiers.is_empty() {
        tiers.push(ContributionTier::Copper);
    }
    tiers.sort();
    tiers.dedup();
    (primary, tiers)
}
