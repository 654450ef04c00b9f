use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub career_api_url: String,
    pub request_timeout: Duration,
    pub history_cap: usize,
    pub search_debounce: Duration,
    /// Sessions idle for longer than this are evicted.
    pub session_ttl: Duration,
    pub data_dir: PathBuf,
    /// When set, saved searches live in Redis instead of `data_dir`.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            career_api_url: require_env("CAREER_API_URL")?,
            request_timeout: Duration::from_secs(parse_env(
                "EXPLORER_REQUEST_TIMEOUT_SECS",
                10,
            )?),
            history_cap: parse_env("EXPLORER_HISTORY_CAP", 50)?,
            search_debounce: Duration::from_millis(parse_env("EXPLORER_SEARCH_DEBOUNCE_MS", 300)?),
            session_ttl: Duration::from_secs(parse_env("EXPLORER_SESSION_TTL_SECS", 1800)?),
            data_dir: std::env::var("EXPLORER_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
