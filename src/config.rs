//! # Configuration Module
//!
//! Data and configuration directory management, the optional `config.json`
//! settings file, and the persisted catalog credential.
//!
//! ## Data Storage
//!
//! - Linux: `~/.local/share/moodtune/` (credential, `history.db`)
//! - macOS: `~/Library/Application Support/moodtune/`
//! - Windows: `%APPDATA%\moodtune\`
//!
//! Settings live in the platform config directory
//! (`~/.config/moodtune/config.json` on Linux). Every field is optional.
//!
//! ## Credential
//!
//! The catalog access token is a single opaque string stored in the data
//! directory. It is read once at startup and passed explicitly, inside a
//! [`CatalogConfig`], to everything that needs it.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detection::DetectionConfig;

const APP_DIR: &str = "moodtune";

/// Returns the platform-appropriate data directory for MoodTune, creating it
/// if needed.
///
/// # Errors
///
/// Fails if the system data directory cannot be determined or created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;
    ensure_app_dir(data_dir.join(APP_DIR))
}

/// Returns the platform-appropriate configuration directory, creating it if
/// needed.
///
/// # Errors
///
/// Fails if the system config directory cannot be determined or created.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!("Could not determine system configuration directory.")
    })?;
    ensure_app_dir(config_dir.join(APP_DIR))
}

fn ensure_app_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create MoodTune directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;
    Ok(dir)
}

/// Path of the mood history database.
///
/// # Errors
///
/// See [`get_data_dir`].
pub fn get_history_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("history.db"))
}

/// User settings, loaded from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_base_url: String,
    pub market: String,
    pub recommendation_limit: usize,
    pub request_timeout_secs: u64,
    pub live_interval_ms: u64,
    pub synthetic_interval_ms: u64,
    pub fallback_catalog_path: Option<PathBuf>,
    pub history_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: "https://api.spotify.com/v1".to_string(),
            market: "US".to_string(),
            recommendation_limit: 15,
            request_timeout_secs: 10,
            live_interval_ms: 1000,
            synthetic_interval_ms: 3000,
            fallback_catalog_path: None,
            history_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load `config.json` from the config directory, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Fails if the directory is unavailable or the file is malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_dir()?.join("config.json"))
    }

    /// Load settings from an explicit path. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Polling cadence for the detection controller.
    #[must_use]
    pub fn detection(&self) -> DetectionConfig {
        DetectionConfig {
            live_interval: Duration::from_millis(self.live_interval_ms),
            synthetic_interval: Duration::from_millis(self.synthetic_interval_ms),
            synthetic_seed: None,
        }
    }

    /// Catalog settings combined with the session's credential.
    #[must_use]
    pub fn catalog(&self, access_token: Option<String>) -> CatalogConfig {
        CatalogConfig {
            base_url: self.catalog_base_url.clone(),
            access_token,
            limit: self.recommendation_limit,
            timeout_secs: self.request_timeout_secs,
            market: self.market.clone(),
        }
    }
}

/// Everything the catalog client needs, passed explicitly at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub limit: usize,
    pub timeout_secs: u64,
    pub market: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        AppConfig::default().catalog(None)
    }
}

impl CatalogConfig {
    /// A credential is present; the sole input to "authenticated".
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Persisted catalog access token.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store in the default data directory.
    ///
    /// # Errors
    ///
    /// See [`get_data_dir`].
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(get_data_dir()?.join("credential")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `token`, trimmed.
    ///
    /// # Errors
    ///
    /// Fails on a blank token or if the file cannot be written.
    pub fn save(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            bail!("Refusing to store an empty access token");
        }
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write credential to {}", self.path.display()))?;
        info!("Stored access token at {}", self.path.display());
        Ok(())
    }

    /// Stored token, if any.
    ///
    /// # Errors
    ///
    /// Fails only if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credential {}", self.path.display()))?;
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// Forget the stored token. Succeeds when nothing is stored.
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be removed.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove credential {}", self.path.display()))?;
            info!("Removed stored access token");
        }
        Ok(())
    }
}

/// Resolve the session credential: explicit token first, then the store.
///
/// # Errors
///
/// Propagates [`CredentialStore::load`] failures.
pub fn resolve_token(explicit: Option<String>, store: &CredentialStore) -> Result<Option<String>> {
    match explicit.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(token) => Ok(Some(token)),
        None => store.load(),
    }
}
