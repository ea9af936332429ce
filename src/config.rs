//! Configuration file parser for ~/.config/marquee/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::TimeWindow;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// `Debug` is implemented by hand so API keys never show up in logs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// TMDB v3 API key. `TMDB_API_KEY` takes precedence.
    pub tmdb_api_key: Option<String>,

    /// OMDb API key. `OMDB_API_KEY` takes precedence.
    pub omdb_api_key: Option<String>,

    /// Override for the TMDB endpoint (proxies, tests). HTTPS unless loopback.
    pub tmdb_base_url: Option<String>,

    /// Override for the OMDb endpoint.
    pub omdb_base_url: Option<String>,

    /// Quiet period before a typed search query is sent.
    pub search_debounce_ms: u64,

    /// How long provider responses are reused.
    pub cache_ttl_seconds: u64,

    /// Maximum number of cached provider responses.
    pub cache_capacity: usize,

    /// Trending window shown at startup ("day" or "week").
    pub default_time_window: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            tmdb_api_key: None,
            omdb_api_key: None,
            tmdb_base_url: None,
            omdb_base_url: None,
            search_debounce_ms: 500,
            cache_ttl_seconds: 300,
            cache_capacity: 256,
            default_time_window: "week".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("theme", &self.theme)
            .field(
                "tmdb_api_key",
                &self.tmdb_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "omdb_api_key",
                &self.omdb_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tmdb_base_url", &self.tmdb_base_url)
            .field("omdb_base_url", &self.omdb_base_url)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("cache_capacity", &self.cache_capacity)
            .field("default_time_window", &self.default_time_window)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 9] = [
    "theme",
    "tmdb_api_key",
    "omdb_api_key",
    "tmdb_base_url",
    "omdb_base_url",
    "search_debounce_ms",
    "cache_ttl_seconds",
    "cache_capacity",
    "default_time_window",
];

/// Shortest accepted debounce quiet period.
const MIN_DEBOUNCE_MS: u64 = 50;

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), theme = %config.theme, "Loaded configuration");
        Ok(config)
    }

    /// TMDB key from the environment or the file, in that order.
    pub fn tmdb_api_key(&self) -> Option<SecretString> {
        resolve_key(
            std::env::var("TMDB_API_KEY").ok(),
            self.tmdb_api_key.as_deref(),
        )
    }

    /// OMDb key from the environment or the file, in that order.
    pub fn omdb_api_key(&self) -> Option<SecretString> {
        resolve_key(
            std::env::var("OMDB_API_KEY").ok(),
            self.omdb_api_key.as_deref(),
        )
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms.max(MIN_DEBOUNCE_MS))
    }

    /// Configured trending window; unrecognized values fall back to a week.
    pub fn time_window(&self) -> TimeWindow {
        self.default_time_window.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid default_time_window, using week");
            TimeWindow::Week
        })
    }
}

fn resolve_key(env: Option<String>, file: Option<&str>) -> Option<SecretString> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| {
            file.filter(|k| !k.trim().is_empty())
                .map(str::to_string)
        })
        .map(SecretString::from)
}

// ============================================================================
// Tests
// ============================================================================
