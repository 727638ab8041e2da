//! # Playback Session
//!
//! Small transport state machine over the active [`TrackList`]. Audio output
//! itself is not modelled; the session only tracks which track is current,
//! whether it is playing, and how far it has progressed.
//!
//! Reaching the end of a track (`on_playback_progress(1.0)`) advances to the
//! next one, wrapping around, so the queue keeps going without user action.

use crate::error::{PipelineError, Result};
use crate::track::{Track, TrackList};
use log::{debug, info, trace};
use serde::Serialize;

/// Skip direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    const fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Transport state. `index` is always valid for a non-empty track list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub index: usize,
    pub is_playing: bool,
    /// Fraction of the current track played, in `[0, 1]`.
    pub progress: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            index: 0,
            is_playing: false,
            progress: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    tracks: Option<TrackList>,
    state: PlaybackState,
}

impl PlaybackSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue and rewind to its first track, paused.
    pub fn load_track_list(&mut self, list: TrackList) {
        info!("Loaded {} tracks for {}", list.len(), list.emotion);
        self.tracks = Some(list);
        self.state = PlaybackState::default();
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn track_list(&self) -> Option<&TrackList> {
        self.tracks.as_ref()
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.as_ref()?.tracks.get(self.state.index)
    }

    fn len(&self) -> usize {
        self.tracks.as_ref().map_or(0, TrackList::len)
    }

    /// Start playing. Returns `false`, changing nothing, when the current
    /// track has no preview source.
    pub fn play(&mut self) -> bool {
        match self.current_track() {
            Some(track) if track.has_preview() => {
                self.state.is_playing = true;
                true
            }
            Some(track) => {
                debug!("No preview for \"{}\", play ignored", track.title);
                false
            }
            None => false,
        }
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    /// Play if paused, pause if playing. Returns the new `is_playing`.
    pub fn toggle(&mut self) -> bool {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
        self.state.is_playing
    }

    /// Move one track in `direction`, wrapping at both ends. No-op on an
    /// empty queue.
    pub fn advance(&mut self, direction: Direction) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let len = len as isize;
        let next = (self.state.index as isize + direction.step() + len).rem_euclid(len);
        self.jump(next as usize);
    }

    /// Record progress on the current track. Returns `true` when the track
    /// ended and the session auto-advanced.
    pub fn on_playback_progress(&mut self, fraction: f64) -> bool {
        if self.len() == 0 {
            return false;
        }
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        trace!("Progress {fraction:.2}");
        if fraction >= 1.0 {
            self.advance(Direction::Forward);
            return true;
        }
        self.state.progress = fraction;
        false
    }

    /// Jump straight to track `index`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::TrackIndexOutOfRange`] if `index` is past the end;
    /// the state is left untouched.
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(PipelineError::TrackIndexOutOfRange { index, len });
        }
        self.jump(index);
        Ok(())
    }

    fn jump(&mut self, index: usize) {
        self.state = PlaybackState {
            index,
            ..PlaybackState::default()
        };
        if let Some(track) = self.current_track() {
            debug!("Now at [{}/{}] \"{}\"", index + 1, self.len(), track.title);
        }
    }
}
