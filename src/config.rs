// src/config.rs
//! Env-driven tunables with defaults; `.env` is loaded by the entrypoint.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Category the landing snapshot is built from.
    pub landing_category: String,
    pub landing_limit: usize,
    pub overfetch_factor: f64,
    pub adapter_timeout: Duration,
    /// Enforced pause between sequential full-content fetches.
    pub scrape_delay: Duration,
    pub news_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            landing_category: env_or("LANDING_CATEGORY", "general"),
            landing_limit: env_parse("LANDING_LIMIT", 30),
            overfetch_factor: env_parse("OVERFETCH_FACTOR", 2.0),
            adapter_timeout: Duration::from_secs(env_parse("ADAPTER_TIMEOUT_SECS", 12)),
            scrape_delay: Duration::from_millis(env_parse("SCRAPE_DELAY_MS", 500)),
            news_api_key: std::env::var("GNEWS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
