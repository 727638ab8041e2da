//! # Recommendation Service
//!
//! Turns an emotion into a [`TrackList`]. Authenticated calls query the live
//! catalog with the emotion's mood profile; every failure, and every
//! unauthenticated call, is answered from the static [`FallbackCatalog`]
//! instead. Callers never see an error.

use crate::catalog::{CatalogClient, FallbackCatalog, RawTrack};
use crate::emotion::EmotionLabel;
use crate::error::CatalogError;
use crate::mood;
use crate::track::{Track, TrackList};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use std::fmt;

/// Reference result count for catalog queries.
pub const DEFAULT_LIMIT: usize = 15;

/// Why the static catalog answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No credential; the catalog was never contacted.
    Unauthenticated,
    /// The catalog was contacted and failed.
    Catalog(CatalogError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Unauthenticated => f.write_str("not authenticated"),
            FallbackReason::Catalog(err) => write!(f, "{err}"),
        }
    }
}

/// Outcome of a recommendation request, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Catalog(TrackList),
    Fallback {
        list: TrackList,
        reason: FallbackReason,
    },
}

impl Recommendation {
    #[must_use]
    pub fn track_list(&self) -> &TrackList {
        match self {
            Recommendation::Catalog(list) | Recommendation::Fallback { list, .. } => list,
        }
    }

    #[must_use]
    pub fn into_track_list(self) -> TrackList {
        match self {
            Recommendation::Catalog(list) | Recommendation::Fallback { list, .. } => list,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Recommendation::Fallback { .. })
    }

    /// `"catalog"` or `"fallback"`, as shown to users and stored in history.
    #[must_use]
    pub fn source(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "catalog"
        }
    }
}

/// Emotion to track list, with uniform fallback on any failure.
pub struct RecommendationService<C: CatalogClient> {
    catalog: C,
    fallback: FallbackCatalog,
    limit: usize,
}

impl<C: CatalogClient> RecommendationService<C> {
    pub fn new(catalog: C, fallback: FallbackCatalog) -> Self {
        Self {
            catalog,
            fallback,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Override the requested result count (at least one).
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Tracks for `emotion`. Never fails.
    #[must_use]
    pub fn recommend(&self, emotion: EmotionLabel, authenticated: bool) -> TrackList {
        self.fetch(emotion, authenticated).into_track_list()
    }

    /// Like [`recommend`](Self::recommend), keeping where the list came from.
    #[must_use]
    pub fn fetch(&self, emotion: EmotionLabel, authenticated: bool) -> Recommendation {
        if !authenticated {
            debug!("Not authenticated, using static catalog for {emotion}");
            return self.fall_back(emotion, FallbackReason::Unauthenticated);
        }

        let query = mood::catalog_query(emotion, self.limit);
        debug!("Catalog query for {emotion}: {query:?}");
        let outcome = self.catalog.recommendations(&query);
        self.finish(emotion, outcome)
    }

    /// Genre search with one seed drawn at random from the mood profile.
    #[must_use]
    pub fn search(&self, emotion: EmotionLabel, authenticated: bool) -> Recommendation {
        if !authenticated {
            return self.fall_back(emotion, FallbackReason::Unauthenticated);
        }

        let profile = mood::targets_for(emotion);
        let genre = profile
            .genre_seeds
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("pop");
        debug!("Genre search for {emotion}: genre:{genre}");
        let outcome = self.catalog.search_genre(genre, self.limit);
        self.finish(emotion, outcome)
    }

    fn finish(
        &self,
        emotion: EmotionLabel,
        outcome: Result<Vec<RawTrack>, CatalogError>,
    ) -> Recommendation {
        let tracks = outcome.and_then(|raw| {
            if raw.is_empty() {
                Err(CatalogError::Empty)
            } else {
                Ok(raw.into_iter().map(Track::from).collect::<Vec<_>>())
            }
        });

        match tracks {
            Ok(tracks) => {
                let list = TrackList::new(emotion, tracks).dedup_ids();
                info!("Catalog returned {} tracks for {emotion}", list.len());
                Recommendation::Catalog(list)
            }
            Err(err) => {
                warn!("Catalog unavailable for {emotion}, using static catalog: {err}");
                self.fall_back(emotion, FallbackReason::Catalog(err))
            }
        }
    }

    fn fall_back(&self, emotion: EmotionLabel, reason: FallbackReason) -> Recommendation {
        Recommendation::Fallback {
            list: self.fallback.for_emotion(emotion),
            reason,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{CatalogQuery, RawArtist};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) fn raw(id: &str, name: &str) -> RawTrack {
        RawTrack {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![RawArtist {
                name: "Test Artist".to_string(),
            }],
            album: None,
            preview_url: Some(format!("https://p.scdn.co/{id}.mp3")),
            external_urls: Default::default(),
        }
    }

    /// Catalog double that counts calls and answers from a fixed outcome.
    pub(crate) struct CountingCatalog {
        pub calls: AtomicUsize,
        pub outcome: Result<Vec<RawTrack>, CatalogError>,
        pub last_query: Mutex<Option<CatalogQuery>>,
        pub last_genre: Mutex<Option<String>>,
    }

    impl CountingCatalog {
        pub(crate) fn answering(outcome: Result<Vec<RawTrack>, CatalogError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome,
                last_query: Mutex::new(None),
                last_genre: Mutex::new(None),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CatalogClient for CountingCatalog {
        fn recommendations(&self, query: &CatalogQuery) -> Result<Vec<RawTrack>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            self.outcome.clone()
        }

        fn search_genre(&self, genre: &str, _limit: usize) -> Result<Vec<RawTrack>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_genre.lock().unwrap() = Some(genre.to_string());
            self.outcome.clone()
        }
    }

    fn service(outcome: Result<Vec<RawTrack>, CatalogError>) -> RecommendationService<CountingCatalog> {
        RecommendationService::new(CountingCatalog::answering(outcome), FallbackCatalog::default())
    }

    #[test]
    fn test_unauthenticated_never_calls_catalog() {
        let service = service(Ok(vec![raw("a", "A")]));
        let first = service.recommend(EmotionLabel::Angry, false);
        let second = service.recommend(EmotionLabel::Angry, false);

        assert_eq!(service.catalog().calls(), 0);
        assert_eq!(first, second);
        assert_eq!(first, FallbackCatalog::default().for_emotion(EmotionLabel::Angry));
    }

    #[test]
    fn test_authenticated_builds_query_from_profile() {
        let service = service(Ok(vec![raw("a", "A"), raw("b", "B")]));
        let outcome = service.fetch(EmotionLabel::Sad, true);

        assert!(!outcome.is_fallback());
        assert_eq!(outcome.track_list().emotion, EmotionLabel::Sad);
        assert_eq!(outcome.track_list().len(), 2);

        let query = service.catalog().last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.genre_seeds, vec!["blues".to_string(), "indie".to_string()]);
        assert!((query.target_valence - 0.2).abs() < 1e-9);
        assert!((query.target_energy - 0.25).abs() < 1e-9);
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_every_failure_falls_back_uniformly() {
        let failures = [
            CatalogError::Unauthorized,
            CatalogError::Network("timed out".to_string()),
            CatalogError::Server(500),
            CatalogError::Malformed("expected `tracks`".to_string()),
        ];
        let expected = FallbackCatalog::default().for_emotion(EmotionLabel::Happy);

        for failure in failures {
            let service = service(Err(failure.clone()));
            let outcome = service.fetch(EmotionLabel::Happy, true);
            assert_eq!(service.catalog().calls(), 1);
            assert_eq!(
                outcome,
                Recommendation::Fallback {
                    list: expected.clone(),
                    reason: FallbackReason::Catalog(failure),
                }
            );
        }
    }

    #[test]
    fn test_empty_catalog_answer_falls_back() {
        let service = service(Ok(Vec::new()));
        match service.fetch(EmotionLabel::Sad, true) {
            Recommendation::Fallback { list, reason } => {
                assert_eq!(reason, FallbackReason::Catalog(CatalogError::Empty));
                assert_eq!(list.tracks[0].id, "mock3");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let service = service(Ok(vec![raw("a", "A"), raw("a", "A again"), raw("b", "B")]));
        let list = service.recommend(EmotionLabel::Neutral, true);
        assert_eq!(list.len(), 2);
        assert_eq!(list.tracks[0].title, "A");
    }

    #[test]
    fn test_search_uses_a_profile_genre() {
        let service = service(Ok(vec![raw("a", "A")]));
        let outcome = service.search(EmotionLabel::Angry, true);
        assert_eq!(outcome.source(), "catalog");

        let genre = service.catalog().last_genre.lock().unwrap().clone().unwrap();
        assert!(mood::targets_for(EmotionLabel::Angry).genre_seeds.contains(&genre.as_str()));
    }

    #[test]
    fn test_limit_is_never_zero() {
        let service = service(Ok(vec![raw("a", "A")])).with_limit(0);
        assert_eq!(service.limit(), 1);
    }
}
