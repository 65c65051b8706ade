//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use crate::feed::SyncMode;
use std::env;
use std::time::Duration;

/// Items per feed page unless FEED_PAGE_SIZE says otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID
    pub project_id: String,
    /// Web API key used by the Identity Toolkit endpoints
    pub api_key: String,
    /// Storage bucket for post images
    pub storage_bucket: String,
    /// Items per feed page
    pub page_size: u32,
    /// How feeds keep their first page current
    pub sync_mode: SyncMode,
    /// Reconnect delay for Firestore listen streams
    pub listen_retry_delay: Duration,
    /// Upper bound on profiles scanned by user search
    pub user_search_limit: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            api_key: "test_api_key".to_string(),
            storage_bucket: "test-project.firebasestorage.app".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            sync_mode: SyncMode::Live,
            listen_retry_delay: Duration::from_millis(5000),
            user_search_limit: 200,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let project_id = env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .unwrap_or_else(|_| "local-dev".to_string());

        let storage_bucket = env::var("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.firebasestorage.app", project_id));

        let page_size = parse_var("FEED_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid("FEED_PAGE_SIZE", "0".to_string()));
        }

        let sync_mode = match env::var("FEED_SYNC_MODE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("FEED_SYNC_MODE", raw))?,
            Err(_) => SyncMode::Live,
        };

        Ok(Self {
            api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            project_id,
            storage_bucket,
            page_size,
            sync_mode,
            listen_retry_delay: Duration::from_millis(parse_var("FEED_LISTEN_RETRY_MS", 5000)?),
            user_search_limit: parse_var("USER_SEARCH_LIMIT", 200)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
