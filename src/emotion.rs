//! # Emotion Data Model
//!
//! Closed set of emotion categories reported by the detector, plus the ranked
//! result produced on every detection tick.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Emotion category reported by the detector.
///
/// Declaration order is the canonical ordering used to break confidence
/// ties, so `Ord` is derived and must not be reordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Surprised,
    Fearful,
    Disgusted,
    Neutral,
}

impl EmotionLabel {
    /// Every label in canonical order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprised,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Neutral,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an unknown emotion name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion `{0}`")]
pub struct UnknownEmotion(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Raw detector output: confidence per category. Missing categories count as 0.
pub type ScoreMap = HashMap<EmotionLabel, f64>;

/// One category with its confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub category: EmotionLabel,
    pub confidence: f64,
}

/// Ranked emotions for a single detection tick.
///
/// Built only by [`crate::algorithm::aggregate`], which guarantees `ranked`
/// holds one entry per label and that `dominant`/`confidence` mirror
/// `ranked[0]`. Never mutated; the next tick produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub dominant: EmotionLabel,
    pub confidence: f64,
    pub ranked: Vec<EmotionScore>,
}

impl EmotionResult {
    /// The `n` strongest emotions, strongest first.
    #[must_use]
    pub fn top(&self, n: usize) -> &[EmotionScore] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Confidence reported for `label`.
    #[must_use]
    pub fn confidence_of(&self, label: EmotionLabel) -> f64 {
        self.ranked
            .iter()
            .find(|score| score.category == label)
            .map_or(0.0, |score| score.confidence)
    }
}
