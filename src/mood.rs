//! # Mood Matching
//!
//! Static per-emotion configuration: which genres seed a catalog query and
//! which valence/energy window the music should sit in. The table is built
//! once, on first use, and never changes afterwards.

use crate::catalog::CatalogQuery;
use crate::emotion::EmotionLabel;
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashMap;

/// Catalog queries carry at most this many genre seeds.
pub const MAX_GENRE_SEEDS: usize = 2;

/// Closed interval inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn center(&self) -> f64 {
        center_of(*self)
    }
}

/// Midpoint of a feature range, used as the single-point catalog target.
#[must_use]
pub fn center_of(range: FeatureRange) -> f64 {
    (range.min + range.max) / 2.0
}

/// Target audio features for one emotion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodProfile {
    /// Non-empty, in preference order.
    pub genre_seeds: Vec<&'static str>,
    pub valence: FeatureRange,
    pub energy: FeatureRange,
    pub description: &'static str,
}

impl MoodProfile {
    /// The first [`MAX_GENRE_SEEDS`] seeds, in order.
    #[must_use]
    pub fn query_seeds(&self) -> &[&'static str] {
        &self.genre_seeds[..self.genre_seeds.len().min(MAX_GENRE_SEEDS)]
    }
}

fn profile(
    genre_seeds: &[&'static str],
    valence: (f64, f64),
    energy: (f64, f64),
    description: &'static str,
) -> MoodProfile {
    MoodProfile {
        genre_seeds: genre_seeds.to_vec(),
        valence: FeatureRange::new(valence.0, valence.1),
        energy: FeatureRange::new(energy.0, energy.1),
        description,
    }
}

lazy_static! {
    static ref MOOD_PROFILES: HashMap<EmotionLabel, MoodProfile> = HashMap::from([
        (
            EmotionLabel::Happy,
            profile(&["pop", "dance", "funk", "reggae"], (0.6, 1.0), (0.5, 1.0), "Upbeat and energetic"),
        ),
        (
            EmotionLabel::Sad,
            profile(&["blues", "indie", "alternative", "acoustic"], (0.0, 0.4), (0.0, 0.5), "Melancholic and reflective"),
        ),
        (
            EmotionLabel::Angry,
            profile(&["rock", "metal", "punk", "hardcore"], (0.0, 0.5), (0.7, 1.0), "Intense and powerful"),
        ),
        (
            EmotionLabel::Surprised,
            profile(&["electronic", "experimental", "synthpop"], (0.4, 0.8), (0.6, 1.0), "Unexpected and dynamic"),
        ),
        (
            EmotionLabel::Fearful,
            profile(&["ambient", "chillout", "downtempo"], (0.0, 0.3), (0.0, 0.4), "Calming and soothing"),
        ),
        (
            EmotionLabel::Disgusted,
            profile(&["grunge", "alternative", "indie-rock"], (0.0, 0.4), (0.4, 0.8), "Raw and authentic"),
        ),
        (
            EmotionLabel::Neutral,
            profile(&["chill", "lofi", "jazz", "classical"], (0.3, 0.7), (0.2, 0.7), "Balanced and versatile"),
        ),
    ]);
}

/// Profile for `emotion`, falling back to `neutral`.
#[must_use]
pub fn targets_for(emotion: EmotionLabel) -> &'static MoodProfile {
    MOOD_PROFILES
        .get(&emotion)
        .unwrap_or_else(|| &MOOD_PROFILES[&EmotionLabel::Neutral])
}

/// Profile for a free-form emotion name. Unknown names get `neutral`.
#[must_use]
pub fn targets_for_name(name: &str) -> &'static MoodProfile {
    let emotion = name.parse().unwrap_or_else(|_| {
        log::debug!("Unknown emotion `{name}', using neutral profile");
        EmotionLabel::Neutral
    });
    targets_for(emotion)
}

/// Recommendation query for `emotion`: first two genre seeds plus the
/// centers of the valence and energy windows.
#[must_use]
pub fn catalog_query(emotion: EmotionLabel, limit: usize) -> CatalogQuery {
    let profile = targets_for(emotion);
    CatalogQuery {
        genre_seeds: profile.query_seeds().iter().map(|g| (*g).to_string()).collect(),
        target_valence: profile.valence.center(),
        target_energy: profile.energy.center(),
        limit,
    }
}
