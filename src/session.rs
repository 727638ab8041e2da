//! # Mood Session
//!
//! Glue between detection and music. Each emitted mood change starts a
//! recommendation fetch on a short-lived thread; the resulting track list is
//! loaded into the [`PlaybackSession`] only if it still answers the latest
//! mood.
//!
//! Every fetch is tagged with a generation number. Starting a new fetch, or
//! calling [`MoodSession::reset`], bumps the generation, so a slow answer for
//! an older mood is dropped when it finally arrives instead of overwriting
//! the newer one.

use crate::catalog::CatalogClient;
use crate::db::HistoryStore;
use crate::detection::{DetectionEvent, EmotionSource};
use crate::emotion::{EmotionLabel, EmotionResult};
use crate::playback::PlaybackSession;
use crate::recommend::{Recommendation, RecommendationService};
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Handle for a recommendation fetch started by a mood change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub generation: u64,
    pub emotion: EmotionLabel,
}

struct Delivery {
    ticket: RequestTicket,
    recommendation: Recommendation,
}

pub struct MoodSession<C: CatalogClient + 'static> {
    service: Arc<RecommendationService<C>>,
    authenticated: bool,
    current: Option<EmotionLabel>,
    generation: u64,
    results_tx: Sender<Delivery>,
    results_rx: Receiver<Delivery>,
    playback: PlaybackSession,
    history: Option<HistoryStore>,
    last: Option<Recommendation>,
}

impl<C: CatalogClient + 'static> MoodSession<C> {
    /// `authenticated` is fixed for the session: it reflects whether a
    /// credential was present at startup.
    pub fn new(service: RecommendationService<C>, authenticated: bool) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            service: Arc::new(service),
            authenticated,
            current: None,
            generation: 0,
            results_tx,
            results_rx,
            playback: PlaybackSession::new(),
            history: None,
            last: None,
        }
    }

    /// Log mood changes and recommendation outcomes to `history`.
    #[must_use]
    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn current_emotion(&self) -> Option<EmotionLabel> {
        self.current
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn service(&self) -> &RecommendationService<C> {
        &self.service
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackSession {
        &mut self.playback
    }

    /// The recommendation currently loaded into playback.
    #[must_use]
    pub fn last_recommendation(&self) -> Option<&Recommendation> {
        self.last.as_ref()
    }

    /// Feed one detection event. Returns the ticket of the fetch it started.
    pub fn handle_event(&mut self, event: &DetectionEvent) -> Option<RequestTicket> {
        match event {
            DetectionEvent::Emotion { result, source } => self.on_emotion(result, *source),
            DetectionEvent::StateChanged(state) => {
                debug!("Session saw detection state {state:?}");
                None
            }
        }
    }

    /// React to a mood. An unchanged dominant emotion starts nothing.
    pub fn on_emotion(&mut self, result: &EmotionResult, source: EmotionSource) -> Option<RequestTicket> {
        if self.current == Some(result.dominant) {
            debug!("Mood still {}, keeping current recommendations", result.dominant);
            return None;
        }

        self.current = Some(result.dominant);
        self.generation += 1;
        let ticket = RequestTicket {
            generation: self.generation,
            emotion: result.dominant,
        };

        if let Some(history) = &self.history {
            if let Err(e) = history.record_mood(result.dominant, result.confidence, source.as_str()) {
                warn!("Could not record mood change: {e:#}");
            }
        }

        self.spawn_fetch(ticket);
        Some(ticket)
    }

    fn spawn_fetch(&self, ticket: RequestTicket) {
        let service = Arc::clone(&self.service);
        let tx = self.results_tx.clone();
        let authenticated = self.authenticated;
        debug!("Fetching recommendations for {} (generation {})", ticket.emotion, ticket.generation);

        let spawned = thread::Builder::new()
            .name("moodtune-recommend".to_string())
            .spawn(move || {
                let recommendation = service.fetch(ticket.emotion, authenticated);
                // the session may be gone already
                let _ = tx.send(Delivery { ticket, recommendation });
            });

        if let Err(e) = spawned {
            warn!("Cannot spawn recommendation fetch, fetching inline: {e}");
            let recommendation = self.service.fetch(ticket.emotion, authenticated);
            let _ = self.results_tx.send(Delivery { ticket, recommendation });
        }
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.generation && self.current == Some(ticket.emotion)
    }

    fn accept(&mut self, delivery: Delivery) -> Option<Recommendation> {
        let Delivery { ticket, recommendation } = delivery;
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale recommendations for {} (generation {}, now {})",
                ticket.emotion, ticket.generation, self.generation
            );
            return None;
        }

        info!(
            "Loaded {} {} tracks for {}",
            recommendation.track_list().len(),
            recommendation.source(),
            ticket.emotion
        );
        if let Some(history) = &self.history {
            let outcome = history.record_recommendation(
                ticket.emotion,
                recommendation.source(),
                recommendation.track_list().len(),
            );
            if let Err(e) = outcome {
                warn!("Could not record recommendation outcome: {e:#}");
            }
        }

        self.playback.load_track_list(recommendation.track_list().clone());
        self.last = Some(recommendation.clone());
        Some(recommendation)
    }

    /// Apply every finished fetch without blocking. Returns the
    /// recommendation that was loaded, if any.
    pub fn poll(&mut self) -> Option<Recommendation> {
        let mut loaded = None;
        while let Ok(delivery) = self.results_rx.try_recv() {
            if let Some(recommendation) = self.accept(delivery) {
                loaded = Some(recommendation);
            }
        }
        loaded
    }

    /// Block up to `timeout` for the current mood's recommendation.
    /// Stale deliveries arriving meanwhile are discarded.
    pub fn wait_for_recommendation(&mut self, timeout: Duration) -> Option<Recommendation> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results_rx.recv_timeout(remaining) {
                Ok(delivery) => {
                    if let Some(recommendation) = self.accept(delivery) {
                        return Some(recommendation);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Forget the current mood and invalidate in-flight fetches, so the next
    /// emitted emotion always fetches again. The loaded track list stays.
    pub fn reset(&mut self) {
        debug!("Session reset at generation {}", self.generation);
        self.current = None;
        self.generation += 1;
    }
}
