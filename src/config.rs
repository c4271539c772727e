//! Configuration for the ingestion worker.
//!
//! Values come from an optional TOML file (`~/.config/harvest/config.toml`
//! by default) and are then overridden by environment variables. A missing
//! file yields `Config::default()`.
use crate::api::CatalogSettings;
use crate::scrape::ScrapeOptions;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value required for the requested operation is not set.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Environment variables that override file settings.
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_API_USERNAME: &str = "API_USERNAME";
pub const ENV_API_PASSWORD: &str = "API_PASSWORD";
pub const ENV_FEED_URLS: &str = "RSS_FEED_URLS";

const KNOWN_KEYS: &[&str] = &[
    "api_base_url",
    "api_username",
    "api_password",
    "feed_urls",
    "user_agent",
    "request_timeout_secs",
    "max_articles_per_page",
    "scrape_concurrency",
    "crawl_frequency_minutes",
    "feed_priority",
];

/// Top-level worker configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks `api_password`.
#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog service.
    pub api_base_url: String,

    pub api_username: Option<String>,

    #[serde(deserialize_with = "deserialize_secret")]
    pub api_password: Option<SecretString>,

    /// Feed or page URLs to ingest, in order.
    pub feed_urls: Vec<String>,

    /// `User-Agent` sent with every outbound fetch.
    pub user_agent: String,

    /// Per-request timeout for fetches and catalog calls.
    pub request_timeout_secs: u64,

    /// Fan-out cap for listing pages.
    pub max_articles_per_page: usize,

    /// Article pages fetched at once when expanding a listing page.
    pub scrape_concurrency: usize,

    /// Crawl schedule recorded on registered feeds.
    pub crawl_frequency_minutes: u32,

    /// Priority recorded on registered feeds.
    pub feed_priority: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            api_username: None,
            api_password: None,
            feed_urls: Vec::new(),
            user_agent: "Harvest/1.0".to_string(),
            request_timeout_secs: 30,
            max_articles_per_page: 10,
            scrape_concurrency: 4,
            crawl_frequency_minutes: 60,
            feed_priority: 10,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_username", &self.api_username)
            .field(
                "api_password",
                &self.api_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("feed_urls", &self.feed_urls)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_articles_per_page", &self.max_articles_per_page)
            .field("scrape_concurrency", &self.scrape_concurrency)
            .field("crawl_frequency_minutes", &self.crawl_frequency_minutes)
            .field("feed_priority", &self.feed_priority)
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Default config location: `$HOME/.config/harvest/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::Missing("HOME"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("harvest")
            .join("config.toml"))
    }

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
        tracing::info!(
            path = %path.display(),
            feeds = config.feed_urls.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`. Blank values are ignored.
    ///
    /// `RSS_FEED_URLS` is a comma-separated list; blank items are dropped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(username) = get(ENV_API_USERNAME) {
            self.api_username = Some(username);
        }
        if let Some(password) = get(ENV_API_PASSWORD) {
            self.api_password = Some(SecretString::from(password));
        }
        if let Some(list) = get(ENV_FEED_URLS) {
            self.feed_urls = parse_url_list(&list);
        }
    }

    /// Checks that credentials and at least one URL are present.
    pub fn validate_for_ingestion(&self) -> Result<(), ConfigError> {
        if !matches!(self.api_username.as_deref(), Some(u) if !u.is_empty()) {
            return Err(ConfigError::Missing(ENV_API_USERNAME));
        }
        if self.api_password.is_none() {
            return Err(ConfigError::Missing(ENV_API_PASSWORD));
        }
        if self.feed_urls.is_empty() {
            return Err(ConfigError::Missing(ENV_FEED_URLS));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            timeout: self.request_timeout(),
            max_articles: self.max_articles_per_page,
            concurrency: self.scrape_concurrency,
        }
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            base_url: self.api_base_url.clone(),
            username: self.api_username.clone(),
            password: self
                .api_password
                .as_ref()
                .map(|p| SecretString::from(p.expose_secret().to_owned())),
            timeout: self.request_timeout(),
            crawl_frequency_minutes: self.crawl_frequency_minutes,
            feed_priority: self.feed_priority,
            ..CatalogSettings::default()
        }
    }
}

fn parse_url_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
