//! Emotion aggregation.
//!
//! Turns raw per-category detector confidences into a ranked [`EmotionResult`].

use crate::emotion::{EmotionLabel, EmotionResult, EmotionScore, ScoreMap};
use std::cmp::Ordering;

/// Aggregate raw detector scores into a ranked result.
///
/// Pure and idempotent. Every [`EmotionLabel`] appears exactly once in
/// `ranked`; labels missing from `scores` get confidence 0. Confidences are
/// clamped into `[0, 1]` and NaN counts as 0, so the sort is a total order:
/// confidence descending, ties broken by canonical label order.
///
/// # Examples
///
/// ```
/// use moodtune::algorithm::aggregate;
/// use moodtune::emotion::{EmotionLabel, ScoreMap};
///
/// let mut scores = ScoreMap::new();
/// scores.insert(EmotionLabel::Sad, 0.8);
/// scores.insert(EmotionLabel::Happy, 0.1);
///
/// let result = aggregate(&scores);
/// assert_eq!(result.dominant, EmotionLabel::Sad);
/// assert_eq!(result.ranked.len(), 7);
/// ```
#[must_use]
pub fn aggregate(scores: &ScoreMap) -> EmotionResult {
    let ranked = rank_scores(
        EmotionLabel::ALL
            .into_iter()
            .map(|category| EmotionScore {
                category,
                confidence: sanitize(scores.get(&category).copied().unwrap_or(0.0)),
            })
            .collect(),
    );

    let head = ranked[0];
    EmotionResult {
        dominant: head.category,
        confidence: head.confidence,
        ranked,
    }
}

/// Sort scores by confidence descending, canonical label order on ties.
#[must_use]
pub fn rank_scores(mut scores: Vec<EmotionScore>) -> Vec<EmotionScore> {
    scores.sort_by(compare_scores);
    scores
}

fn compare_scores(a: &EmotionScore, b: &EmotionScore) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.category.cmp(&b.category))
}

#[inline]
fn sanitize(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
