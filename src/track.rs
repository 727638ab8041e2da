//! Track records and per-emotion track lists.

use crate::emotion::EmotionLabel;
use serde::{Deserialize, Serialize};

/// A playable recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique within one [`TrackList`].
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub album_art_url: Option<String>,
    /// `None` means the track cannot be previewed in-app.
    #[serde(default)]
    pub preview_url: Option<String>,
    pub external_url: String,
}

impl Track {
    #[must_use]
    pub fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    /// Artists joined for display, e.g. `"Lizzo, Missy Elliott"`.
    #[must_use]
    pub fn artists_display(&self) -> String {
        self.artist_names.join(", ")
    }
}

/// Tracks recommended for one emotion. Replaced wholesale on every mood change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackList {
    pub emotion: EmotionLabel,
    pub tracks: Vec<Track>,
}

impl TrackList {
    #[must_use]
    pub fn new(emotion: EmotionLabel, tracks: Vec<Track>) -> Self {
        Self { emotion, tracks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop later entries whose id was already seen, keeping order.
    #[must_use]
    pub fn dedup_ids(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.tracks.retain(|track| seen.insert(track.id.clone()));
        self
    }
}
