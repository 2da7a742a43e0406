use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails with context when a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the service runs on the in-memory document store
    /// (local development only; nothing survives a restart).
    pub database_url: Option<String>,
    /// When unset the service runs with the in-process cache backend.
    pub redis_url: Option<String>,
    /// When unset recommendations fall back to the deterministic scorer.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// TTL for `api:` and `user:` cached payloads.
    pub cache_ttl_secs: u64,
    /// TTL for `recommendation:` cached payloads.
    pub recommendation_ttl_secs: u64,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cache_ttl_secs: parsed_env("CACHE_TTL_SECS", 300)?,
            recommendation_ttl_secs: parsed_env("RECOMMENDATION_TTL_SECS", 3600)?,
            session_ttl_hours: parsed_env("SESSION_TTL_HOURS", 168)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}
