//! # Error Taxonomy
//!
//! Every failure in the detection and recommendation pipeline is recoverable.
//! These types exist so the degraded path can be logged precisely; callers of
//! [`crate::recommend::RecommendationService`] never see a [`CatalogError`],
//! they see a [`crate::recommend::Recommendation::Fallback`] instead.
//!
//! Application glue (config, credential file, history database, CLI) keeps
//! using `anyhow::Result`.

use thiserror::Error;

/// Failures of the music catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The access token was rejected (HTTP 401/403).
    #[error("catalog rejected the access token")]
    Unauthorized,

    /// The request never produced a response.
    #[error("catalog network error: {0}")]
    Network(String),

    /// The catalog answered with a server-side failure status.
    #[error("catalog server error: HTTP {0}")]
    Server(u16),

    /// The response body could not be decoded into track records.
    #[error("malformed catalog response: {0}")]
    Malformed(String),

    /// The catalog answered successfully but with zero tracks.
    #[error("catalog returned no tracks")]
    Empty,
}

/// Pipeline error taxonomy.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Camera denied or absent. Triggers the synthetic generator.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    /// The detector capability failed on a tick, or found no subject.
    #[error("detection failure: {0}")]
    DetectionFailure(String),

    /// Catalog query failed. Triggers the static catalog.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),

    /// `select_track` was given an index outside the loaded track list.
    #[error("track index {index} out of range for {len} tracks")]
    TrackIndexOutOfRange { index: usize, len: usize },

    /// `activate` was called while the polling loop is already running.
    #[error("detection controller is already running")]
    ControllerBusy,
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
