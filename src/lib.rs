//! Emotion-driven music recommendations.
//!
//! MoodTune watches the listener's face (or a recording of detector scores),
//! decides which emotion dominates, and keeps a playlist matched to it. When
//! there is no camera, no model or no catalog credential the session keeps
//! working on degraded inputs: a synthetic emotion cycle and a curated
//! fallback catalog.
//!
//! Core modules:
//! - [`detection`] - Detection lifecycle and polling loop
//! - [`algorithm`] - Score aggregation and ranking
//! - [`recommend`] - Emotion to track list, with fallback
//! - [`session`] - Mood changes to recommendations to playback
//! - [`playback`] - Transport state machine over the active track list
//!
//! ### Supporting Modules
//!
//! - [`emotion`] / [`track`] - Data model
//! - [`synthetic`] - Synthetic emotion generator
//! - [`sensor`] - Camera and detector capabilities
//! - [`mood`] - Per-emotion genre and audio-feature targets
//! - [`catalog`] - Live catalog client and curated fallback lists
//! - [`config`] - Settings, credential and data directory management
//! - [`db`] - Mood history database
//! - [`error`] - Pipeline error taxonomy
//! - [`cli`] / [`completion`] - Command-line interface
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodtune::catalog::{FallbackCatalog, SpotifyCatalog};
//! use moodtune::config::CatalogConfig;
//! use moodtune::detection::{DetectionConfig, DetectionController};
//! use moodtune::recommend::RecommendationService;
//! use moodtune::sensor::{NullDetector, UnavailableCamera};
//! use moodtune::session::MoodSession;
//! use std::time::Duration;
//!
//! let catalog = SpotifyCatalog::new(&CatalogConfig::default())?;
//! let service = RecommendationService::new(catalog, FallbackCatalog::default());
//! let mut session = MoodSession::new(service, false);
//!
//! let mut controller =
//!     DetectionController::new(UnavailableCamera, NullDetector, DetectionConfig::default());
//! let events = controller.subscribe();
//! controller.activate()?;
//!
//! for event in events.iter().take(4) {
//!     session.handle_event(&event);
//!     if let Some(rec) = session.wait_for_recommendation(Duration::from_millis(100)) {
//!         println!("{} tracks for {}", rec.track_list().len(), rec.track_list().emotion);
//!     }
//! }
//! controller.deactivate();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Degraded Modes
//!
//! ### No camera
//! - Camera denial or detector failure moves detection to `SensorDenied`
//! - A synthetic cycle (happy, sad, neutral, surprised) drives moods instead
//!
//! ### No catalog
//! - Without a credential the catalog is never contacted
//! - Any catalog failure substitutes the curated list for that emotion
//!
//! ## Data Storage
//!
//! See [`config`] for platform paths of the credential and history database.

pub mod algorithm;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod detection;
pub mod emotion;
pub mod error;
pub mod mood;
pub mod playback;
pub mod recommend;
pub mod sensor;
pub mod session;
pub mod synthetic;
pub mod track;
