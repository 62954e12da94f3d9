//! Composite scoring and epoch qualification
//!
//! | Step | Rule |
//! |------|------|
//! | score | `floor(coherence * density * novelty / 10,000²)`, capped at 10,000 |
//! | epoch | first of Founding → Abundance whose density floor is met |

use crate::evaluator::Evaluation;
use tessera_economics::{Epoch, SCORE_SCALE};

/// Composite score of three dimensions on `0..=SCORE_SCALE`
pub fn composite_score(coherence: u32, density: u32, novelty: u32) -> u32 {
    let scale = u128::from(SCORE_SCALE);
    let product = u128::from(coherence) * u128::from(density) * u128::from(novelty);
    let score = (product / (scale * scale)).min(scale);
    // bounded by SCORE_SCALE above
    score as u32
}

/// Composite score of an evaluation
pub fn evaluation_score(evaluation: &Evaluation) -> u32 {
    composite_score(evaluation.coherence, evaluation.density, evaluation.novelty)
}

/// Epoch a submission with this density qualifies for
///
/// Total: Abundance has a zero floor, so every density qualifies somewhere.
pub fn qualify_epoch(density: u32) -> Epoch {
    Epoch::ALL
        .into_iter()
        .find(|e| density >= e.qualification_density())
        .unwrap_or(Epoch::Abundance)
}
