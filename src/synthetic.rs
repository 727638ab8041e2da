//! Synthetic emotion source used when no camera or detector is available.
//!
//! Cycles through a fixed label sequence, one step per call. The active
//! label draws its confidence from `[0.7, 1.0)` and every other label from
//! `[0.0, 0.3)`, so the active label always wins aggregation.

use crate::algorithm::aggregate;
use crate::emotion::{EmotionLabel, EmotionResult, ScoreMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Labels visited by the generator, in order.
pub const SYNTHETIC_CYCLE: [EmotionLabel; 4] = [
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Neutral,
    EmotionLabel::Surprised,
];

const ACTIVE_RANGE: Range<f64> = 0.7..1.0;
const BACKGROUND_RANGE: Range<f64> = 0.0..0.3;

/// Deterministic cyclic substitute for a live sensor.
#[derive(Debug)]
pub struct SyntheticEmotionGenerator {
    position: usize,
    rng: StdRng,
}

impl Default for SyntheticEmotionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticEmotionGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with reproducible confidence draws.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            position: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Label the next call will make dominant.
    #[must_use]
    pub fn upcoming(&self) -> EmotionLabel {
        SYNTHETIC_CYCLE[self.position]
    }

    /// Produce the result for the current cycle position and advance.
    pub fn next_result(&mut self) -> EmotionResult {
        let active = self.upcoming();
        let scores: ScoreMap = EmotionLabel::ALL
            .into_iter()
            .map(|label| {
                let range = if label == active {
                    ACTIVE_RANGE
                } else {
                    BACKGROUND_RANGE
                };
                (label, self.rng.gen_range(range))
            })
            .collect();

        self.position = (self.position + 1) % SYNTHETIC_CYCLE.len();
        log::trace!("Synthetic tick produced `{active}'");
        aggregate(&scores)
    }

    /// Back to the start of the cycle.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Iterator for SyntheticEmotionGenerator {
    type Item = EmotionResult;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_result())
    }
}
