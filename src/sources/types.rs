// src/sources/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Canonical article shape every adapter must produce.
///
/// Wire JSON uses camelCase (`publishedAt`, `fullContent`) for the
/// presentation layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Short plain-text summary; may be empty.
    pub description: String,
    /// Canonical source URL; primary dedup key.
    pub url: String,
    /// Human-readable origin label, e.g. a site or feed name.
    pub source: String,
    /// Defaults to ingestion time when the upstream omits it.
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Extracted body text, populated only when scraping was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}

impl Article {
    /// `url` and `title` must never both be empty; offenders are dropped
    /// before merge.
    pub fn is_valid(&self) -> bool {
        !(self.url.trim().is_empty() && self.title.trim().is_empty())
    }
}

/// One upstream source family (REST/JSON, RSS/XML, HTML listing) behind a
/// single capability, so the aggregator treats them uniformly.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch at most `limit` articles for `category` (adapters fall back to
    /// a source-specific default for labels they don't know). Concrete
    /// adapters resolve upstream failures to `Ok(vec![])` and log them; the
    /// `Result` exists for the trait surface and the aggregator tolerates
    /// `Err` all the same.
    async fn fetch(&self, category: &str, limit: usize) -> Result<Vec<Article>>;
    fn name(&self) -> &str;
}
