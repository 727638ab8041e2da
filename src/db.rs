//! # Mood History Database
//!
//! Optional `SQLite` log of what the session did: every emitted mood change
//! and every recommendation outcome (catalog or fallback). Nothing in the
//! pipeline reads it back; it exists for `moodtune history`.
//!
//! ## Schema
//!
//! ```sql
//! mood_changes    (id, emotion, confidence, source, recorded_at)
//! recommendations (id, emotion, source, track_count, recorded_at)
//! ```
//!
//! Timestamps are fixed-width RFC 3339 strings in UTC, so text order is time
//! order.

use crate::emotion::EmotionLabel;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, trace};
use rusqlite::{params, Connection};
use std::path::Path;

/// One row of `mood_changes`, newest first when listed.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodRecord {
    pub id: i64,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    /// `"live"` or `"synthetic"`.
    pub source: String,
    pub recorded_at: DateTime<Utc>,
    /// Outcome of the recommendation that followed, if one was recorded.
    pub recommendation: Option<String>,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open history database at {}", path.display()))?;
        Self::init(conn)
    }

    /// In-memory store that vanishes with the session.
    ///
    /// # Errors
    ///
    /// Fails if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory history")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS mood_changes (
                id          INTEGER PRIMARY KEY,
                emotion     TEXT    NOT NULL,
                confidence  REAL    NOT NULL,
                source      TEXT    NOT NULL,
                recorded_at TEXT    NOT NULL
            );
            CREATE TABLE IF NOT EXISTS recommendations (
                id          INTEGER PRIMARY KEY,
                emotion     TEXT    NOT NULL,
                source      TEXT    NOT NULL,
                track_count INTEGER NOT NULL,
                recorded_at TEXT    NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mood_changes_time ON mood_changes(recorded_at);",
        )
        .context("Failed to create history tables")?;
        debug!("History database ready");
        Ok(Self { conn })
    }

    /// Log an emitted mood change.
    ///
    /// # Errors
    ///
    /// Fails on any `SQLite` error.
    pub fn record_mood(&self, emotion: EmotionLabel, confidence: f64, source: &str) -> Result<()> {
        trace!("Recording mood {emotion} ({confidence:.2}, {source})");
        self.conn
            .execute(
                "INSERT INTO mood_changes (emotion, confidence, source, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![emotion.as_str(), confidence, source, timestamp()],
            )
            .context("Failed to INSERT mood change")?;
        Ok(())
    }

    /// Log where a delivered recommendation came from.
    ///
    /// # Errors
    ///
    /// Fails on any `SQLite` error.
    pub fn record_recommendation(
        &self,
        emotion: EmotionLabel,
        source: &str,
        track_count: usize,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO recommendations (emotion, source, track_count, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![emotion.as_str(), source, sql_count(track_count), timestamp()],
            )
            .context("Failed to INSERT recommendation outcome")?;
        Ok(())
    }

    /// The `limit` most recent mood changes, newest first, each joined with
    /// the first recommendation recorded for that emotion at or after it.
    ///
    /// # Errors
    ///
    /// Fails on any `SQLite` error or on a row that cannot be decoded.
    pub fn recent_moods(&self, limit: usize) -> Result<Vec<MoodRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT m.id, m.emotion, m.confidence, m.source, m.recorded_at,
                        (SELECT r.source FROM recommendations r
                          WHERE r.emotion = m.emotion AND r.recorded_at >= m.recorded_at
                          ORDER BY r.recorded_at, r.id LIMIT 1)
                   FROM mood_changes m
                  ORDER BY m.recorded_at DESC, m.id DESC
                  LIMIT ?1",
            )
            .context("Invalid SQL statement when SELECTing mood history")?;

        let rows = stmt
            .query_map([sql_count(limit)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })
            .context("Cannot query mood history")?;

        let mut records = Vec::new();
        for row in rows {
            let (id, emotion, confidence, source, recorded_at, recommendation) =
                row.context("Failed to read mood history row")?;
            records.push(MoodRecord {
                id,
                emotion: emotion
                    .parse()
                    .with_context(|| format!("Unknown emotion `{emotion}' in history row {id}"))?,
                confidence,
                source,
                recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                    .with_context(|| format!("Bad timestamp in history row {id}"))?
                    .with_timezone(&Utc),
                recommendation,
            });
        }
        Ok(records)
    }

    /// Number of recorded mood changes.
    ///
    /// # Errors
    ///
    /// Fails on any `SQLite` error.
    pub fn mood_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mood_changes", [], |row| row.get(0))
            .context("Could not count mood history entries")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

/// `SQLite` integers are signed; saturate instead of wrapping.
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
