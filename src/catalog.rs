//! # Music Catalog
//!
//! - [`CatalogClient`]: the query capability the recommendation service needs
//! - [`SpotifyCatalog`]: blocking HTTP implementation against a
//!   Spotify-compatible Web API
//! - [`FallbackCatalog`]: curated static track lists used whenever the live
//!   catalog cannot answer

use crate::config::CatalogConfig;
use crate::emotion::EmotionLabel;
use crate::error::CatalogError;
use crate::track::{Track, TrackList};
use anyhow::{Context, Result};
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Recommendation query built from a mood profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    /// At most two seeds.
    pub genre_seeds: Vec<String>,
    pub target_valence: f64,
    pub target_energy: f64,
    pub limit: usize,
}

/// Track record as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    #[serde(default)]
    pub album: Option<RawAlbum>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAlbum {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<RawImage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawImage {
    pub url: String,
}

impl From<RawTrack> for Track {
    fn from(raw: RawTrack) -> Self {
        let external_url = raw
            .external_urls
            .get("spotify")
            .cloned()
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", raw.id));
        let (album_name, album_art_url) = match raw.album {
            Some(album) => (album.name, album.images.into_iter().next().map(|i| i.url)),
            None => (None, None),
        };

        Track {
            id: raw.id,
            title: raw.name,
            artist_names: raw.artists.into_iter().map(|a| a.name).collect(),
            album_name,
            album_art_url,
            preview_url: raw.preview_url,
            external_url,
        }
    }
}

/// Query capability of the music catalog.
pub trait CatalogClient: Send + Sync {
    /// Tracks matching genre seeds and target features.
    ///
    /// # Errors
    ///
    /// Any [`CatalogError`]; callers substitute the static catalog.
    fn recommendations(&self, query: &CatalogQuery) -> Result<Vec<RawTrack>, CatalogError>;

    /// Free-text genre search (`genre:<genre>`).
    ///
    /// # Errors
    ///
    /// Any [`CatalogError`]; callers substitute the static catalog.
    fn search_genre(&self, genre: &str, limit: usize) -> Result<Vec<RawTrack>, CatalogError>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for Arc<C> {
    fn recommendations(&self, query: &CatalogQuery) -> Result<Vec<RawTrack>, CatalogError> {
        (**self).recommendations(query)
    }

    fn search_genre(&self, genre: &str, limit: usize) -> Result<Vec<RawTrack>, CatalogError> {
        (**self).search_genre(genre, limit)
    }
}

#[derive(Deserialize)]
struct RecommendationsResponse {
    tracks: Vec<RawTrack>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Deserialize)]
struct SearchPage {
    items: Vec<RawTrack>,
}

/// Blocking client for a Spotify-compatible Web API.
pub struct SpotifyCatalog {
    client: reqwest::blocking::Client,
    base_url: String,
    access_token: Option<String>,
    market: String,
}

impl SpotifyCatalog {
    /// Build a client from catalog configuration.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create catalog HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            market: config.market.clone(),
        })
    }

    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let token = self.access_token.as_deref().ok_or(CatalogError::Unauthorized)?;
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("GET {url} {params:?}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        check_status(response.status())?;
        response
            .json::<T>()
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

fn check_status(status: StatusCode) -> Result<(), CatalogError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Unauthorized),
        s => Err(CatalogError::Server(s.as_u16())),
    }
}

impl CatalogClient for SpotifyCatalog {
    fn recommendations(&self, query: &CatalogQuery) -> Result<Vec<RawTrack>, CatalogError> {
        let params = [
            ("seed_genres", query.genre_seeds.join(",")),
            ("target_valence", query.target_valence.to_string()),
            ("target_energy", query.target_energy.to_string()),
            ("limit", query.limit.to_string()),
        ];
        let body: RecommendationsResponse = self.get("recommendations", &params)?;
        Ok(body.tracks)
    }

    fn search_genre(&self, genre: &str, limit: usize) -> Result<Vec<RawTrack>, CatalogError> {
        let params = [
            ("q", format!("genre:{genre}")),
            ("type", "track".to_string()),
            ("limit", limit.to_string()),
            ("market", self.market.clone()),
        ];
        let body: SearchResponse = self.get("search", &params)?;
        Ok(body.tracks.items)
    }
}

/// Curated per-emotion track lists. Emotions without an entry get `happy`.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackCatalog {
    lists: HashMap<EmotionLabel, Vec<Track>>,
}

const HAPPY_ART: &str = "https://images.pexels.com/photos/1763075/pexels-photo-1763075.jpeg";
const SAD_ART: &str = "https://images.pexels.com/photos/210922/pexels-photo-210922.jpeg";

fn curated(id: &str, title: &str, artist: &str, album: &str, art: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist_names: vec![artist.to_string()],
        album_name: Some(album.to_string()),
        album_art_url: Some(art.to_string()),
        preview_url: None,
        external_url: "#".to_string(),
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        Self {
            lists: HashMap::from([
                (
                    EmotionLabel::Happy,
                    vec![
                        curated("mock1", "Good as Hell", "Lizzo", "Good as Hell", HAPPY_ART),
                        curated("mock2", "Happy", "Pharrell Williams", "GIRL", HAPPY_ART),
                    ],
                ),
                (
                    EmotionLabel::Sad,
                    vec![
                        curated("mock3", "Someone Like You", "Adele", "21", SAD_ART),
                        curated("mock4", "Mad World", "Gary Jules", "Mad World", SAD_ART),
                    ],
                ),
            ]),
        }
    }
}

impl FallbackCatalog {
    /// Load curated lists from a JSON object of `emotion -> [track]`.
    ///
    /// Emotions absent from the file keep no entry; `happy` falls back to the
    /// built-in list if the file does not provide it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid mapping.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback catalog {}", path.display()))?;
        let mut lists: HashMap<EmotionLabel, Vec<Track>> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid fallback catalog {}", path.display()))?;

        lists.retain(|_, tracks| !tracks.is_empty());
        if !lists.contains_key(&EmotionLabel::Happy) {
            let mut builtin = Self::default();
            if let Some(happy) = builtin.lists.remove(&EmotionLabel::Happy) {
                lists.insert(EmotionLabel::Happy, happy);
            }
        }
        Ok(Self { lists })
    }

    /// Whether `emotion` has its own curated list.
    #[must_use]
    pub fn has_entry(&self, emotion: EmotionLabel) -> bool {
        self.lists.contains_key(&emotion)
    }

    /// Curated list for `emotion`, or the `happy` list.
    #[must_use]
    pub fn for_emotion(&self, emotion: EmotionLabel) -> TrackList {
        let tracks = self
            .lists
            .get(&emotion)
            .or_else(|| self.lists.get(&EmotionLabel::Happy))
            .cloned()
            .unwrap_or_default();
        TrackList::new(emotion, tracks)
    }
}
