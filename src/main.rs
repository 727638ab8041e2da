//! # MoodTune
//!
//! Detects the listener's mood (from a camera feed, a recorded replay, or a
//! synthetic cycle when neither is available) and keeps a playlist matched
//! to it.
//!
//! ## Usage
//!
//! ```bash
//! # Synthetic moods, static catalog, 30 seconds
//! moodtune run
//!
//! # Replay recorded scores against the live catalog
//! moodtune auth "$TOKEN"
//! moodtune run --replay faces.jsonl --seconds 60
//!
//! # One-shot recommendation
//! moodtune recommend happy
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use moodtune::catalog::{FallbackCatalog, SpotifyCatalog};
use moodtune::config::{self, AppConfig, CatalogConfig, CredentialStore};
use moodtune::db::HistoryStore;
use moodtune::detection::{DetectionController, DetectionEvent, DetectionState, EmotionSource};
use moodtune::emotion::{EmotionLabel, EmotionResult};
use moodtune::mood;
use moodtune::recommend::{Recommendation, RecommendationService};
use moodtune::sensor::{NullDetector, ReplayCamera, ReplayDetector, UnavailableCamera};
use moodtune::session::MoodSession;
use moodtune::{cli, completion};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

/// How often the run loop wakes up to apply results and advance playback.
const RUN_TICK: Duration = Duration::from_millis(250);
/// Simulated playback progress per run-loop tick.
const PROGRESS_STEP: f64 = 0.05;

/// Initializes logging, parses arguments and routes commands.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug moodtune run` - Enable debug logging
/// - `RUST_LOG=moodtune::detection=trace moodtune run` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Run {
            seconds,
            replay,
            token,
        } => run(Duration::from_secs(seconds), replay, token)?,
        cli::Command::Recommend {
            emotion,
            search,
            token,
        } => recommend(emotion, search, token)?,
        cli::Command::Moods => print_moods(),
        cli::Command::Auth { token } => {
            CredentialStore::open_default()?.save(&token)?;
            println!("Access token stored. Recommendations will use the live catalog.");
        }
        cli::Command::Logout => {
            CredentialStore::open_default()?.clear()?;
            println!("Access token removed. Recommendations will use the curated catalog.");
        }
        cli::Command::History { limit } => print_history(limit)?,
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(
                completion::shell_to_completion_shell(&shell),
                &mut cmd,
                &mut io::stdout(),
            );
        }
    }

    Ok(())
}

fn catalog_config(settings: &AppConfig, token: Option<String>) -> Result<CatalogConfig> {
    let store = CredentialStore::open_default()?;
    let token = config::resolve_token(token, &store)?;
    Ok(settings.catalog(token))
}

fn build_service(
    settings: &AppConfig,
    catalog: &CatalogConfig,
) -> Result<RecommendationService<SpotifyCatalog>> {
    let fallback = match &settings.fallback_catalog_path {
        Some(path) => {
            let fallback = FallbackCatalog::from_json_file(path)?;
            for label in EmotionLabel::ALL.into_iter().filter(|l| !fallback.has_entry(*l)) {
                warn!("{} has no `{label}` list, the happy list stands in", path.display());
            }
            fallback
        }
        None => FallbackCatalog::default(),
    };
    Ok(RecommendationService::new(SpotifyCatalog::new(catalog)?, fallback).with_limit(catalog.limit))
}

fn open_history(settings: &AppConfig) -> Option<HistoryStore> {
    if !settings.history_enabled {
        return None;
    }
    let opened = config::get_history_db_path().and_then(|path| HistoryStore::open(&path));
    match opened {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Mood history disabled: {e:#}");
            None
        }
    }
}

fn run(duration: Duration, replay: Option<PathBuf>, token: Option<String>) -> Result<()> {
    let settings = AppConfig::load()?;
    let catalog = catalog_config(&settings, token)?;
    let authenticated = catalog.is_authenticated();
    if !authenticated {
        println!("No access token, using the curated catalog (see `moodtune auth`).");
    }

    let service = build_service(&settings, &catalog)?;
    let mut session = MoodSession::new(service, authenticated);
    if let Some(history) = open_history(&settings) {
        session = session.with_history(history);
    }

    let mut controller = match replay {
        Some(path) => {
            let camera = ReplayCamera::new(path);
            println!("Reading emotion scores from {}", camera.path().display());
            DetectionController::new(camera, ReplayDetector, settings.detection())
        }
        None => DetectionController::new(UnavailableCamera, NullDetector, settings.detection()),
    };
    let events = controller.subscribe();
    controller.activate().context("Failed to start mood detection")?;
    info!("Running for {}s", duration.as_secs());

    let deadline = Instant::now() + duration;
    let mut progress = 0.0;
    while Instant::now() < deadline {
        match events.recv_timeout(RUN_TICK) {
            Ok(event) => {
                report_event(&event);
                session.handle_event(&event);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(recommendation) = session.poll() {
            print_recommendation(&recommendation);
            progress = 0.0;
            start_current(&mut session);
        }

        // tracks without a preview still "play" here so the queue visibly moves
        let playback = session.playback_mut();
        if playback.current_track().is_some() {
            progress += PROGRESS_STEP;
            if playback.on_playback_progress(progress) {
                progress = 0.0;
                start_current(&mut session);
            }
        }
    }

    controller.deactivate();
    session.reset();
    println!("Stopped.");
    Ok(())
}

fn start_current(session: &mut MoodSession<SpotifyCatalog>) {
    let playback = session.playback_mut();
    let Some(track) = playback.current_track() else {
        return;
    };
    let line = format!("{} - {}", track.artists_display(), track.title);
    let index = playback.state().index + 1;
    if playback.play() {
        println!("  ▶ [{index}] {line}");
    } else {
        println!("  ⏭ [{index}] {line} (no preview)");
    }
}

fn report_event(event: &DetectionEvent) {
    match event {
        DetectionEvent::StateChanged(DetectionState::SensorDenied(reason)) => {
            println!("Camera unavailable ({reason}); using simulated emotions.");
        }
        DetectionEvent::StateChanged(state) => debug!("Detection state {state:?}"),
        DetectionEvent::Emotion { result, source } => print_emotion(result, *source),
    }
}

fn print_emotion(result: &EmotionResult, source: EmotionSource) {
    let marker = match source {
        EmotionSource::Live => "",
        EmotionSource::Synthetic => " (simulated)",
    };
    println!(
        "Mood: {} {:.0}%{marker} - {}",
        result.dominant,
        result.confidence_of(result.dominant) * 100.0,
        mood::targets_for(result.dominant).description
    );
    for score in result.top(5).iter().skip(1) {
        println!("       {:<10} {:>3.0}%", score.category.as_str(), score.confidence * 100.0);
    }
}

fn print_recommendation(recommendation: &Recommendation) {
    let list = recommendation.track_list();
    match recommendation {
        Recommendation::Catalog(_) => println!("{} tracks for {}:", list.len(), list.emotion),
        Recommendation::Fallback { reason, .. } => {
            println!("{} curated tracks for {} ({reason}):", list.len(), list.emotion);
        }
    }
    for (i, track) in list.tracks.iter().enumerate() {
        let album = track.album_name.as_deref().map(|a| format!(" [{a}]")).unwrap_or_default();
        println!("  {:>2}. {} - {}{album}", i + 1, track.artists_display(), track.title);
    }
}

fn recommend(emotion: EmotionLabel, search: bool, token: Option<String>) -> Result<()> {
    let settings = AppConfig::load()?;
    let catalog = catalog_config(&settings, token)?;
    let service = build_service(&settings, &catalog)?;

    let recommendation = if search {
        service.search(emotion, catalog.is_authenticated())
    } else {
        service.fetch(emotion, catalog.is_authenticated())
    };
    print_recommendation(&recommendation);
    Ok(())
}

fn print_moods() {
    for label in EmotionLabel::ALL {
        let profile = mood::targets_for(label);
        println!("{label:<10} {}", profile.description);
        println!("           genres:  {}", profile.genre_seeds.join(", "));
        println!(
            "           valence: {:.1}-{:.1}  energy: {:.1}-{:.1}",
            profile.valence.min, profile.valence.max, profile.energy.min, profile.energy.max
        );
    }
}

fn print_history(limit: usize) -> Result<()> {
    let store = HistoryStore::open(&config::get_history_db_path()?)?;
    let records = store.recent_moods(limit)?;
    if records.is_empty() {
        println!("No moods recorded yet. Try `moodtune run`.");
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {:<10} {:>3.0}%  {:<9} {}",
            record.recorded_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            record.emotion.as_str(),
            record.confidence * 100.0,
            record.source,
            record.recommendation.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
