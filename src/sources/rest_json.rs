// src/sources/rest_json.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::sources::types::{Article, SourceAdapter};
use crate::sources::{normalize_text, parse_feed_date};

// GNews-style top-headlines payload.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    published_at: Option<String>,
    source: Option<ApiSource>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

/// REST/JSON adapter for GNews-compatible endpoints. A missing API key,
/// non-2xx status, timeout or undecodable payload all resolve to an empty
/// result; only the logs and the error counter tell them apart.
pub struct RestJsonAdapter {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    lang: String,
    client: reqwest::Client,
}

impl RestJsonAdapter {
    pub fn new(
        name: &str,
        endpoint: &str,
        api_key: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            api_key,
            lang: "en".to_string(),
            client,
        }
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    /// Map the upstream JSON body to articles, bounded to `limit`. Pure over
    /// the body string for unit tests without a network.
    pub fn parse_response(name: &str, body: &str, limit: usize) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        let resp: ApiResponse = serde_json::from_str(body).context("decoding news api json")?;
        let mut out = Vec::with_capacity(resp.articles.len().min(limit));

        for a in resp.articles {
            if out.len() >= limit {
                break;
            }
            let article = Article {
                title: normalize_text(a.title.as_deref().unwrap_or_default()),
                description: normalize_text(a.description.as_deref().unwrap_or_default()),
                url: a.url.unwrap_or_default().trim().to_string(),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| name.to_string()),
                published_at: a
                    .published_at
                    .as_deref()
                    .and_then(parse_feed_date)
                    .unwrap_or_else(chrono::Utc::now),
                image: a.image,
                full_content: None,
            };
            if !article.is_valid() {
                continue;
            }
            out.push(article);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("source_parse_ms").record(ms);
        counter!("source_articles_total").increment(out.len() as u64);

        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RestJsonAdapter {
    async fn fetch(&self, category: &str, limit: usize) -> Result<Vec<Article>> {
        crate::sources::ensure_metrics_described();

        let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            tracing::warn!(source = %self.name, "api key missing, returning empty result");
            counter!("source_errors_total").increment(1);
            return Ok(Vec::new());
        };

        let category = if category.is_empty() { "general" } else { category };
        let params = [
            ("category", category.to_string()),
            ("lang", self.lang.clone()),
            ("max", limit.to_string()),
            ("apikey", key.to_string()),
        ];

        let resp = match self.client.get(&self.endpoint).query(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "news api request failed");
                counter!("source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(
                status = %resp.status(),
                source = %self.name,
                "news api returned non-success"
            );
            counter!("source_errors_total").increment(1);
            return Ok(Vec::new());
        }

        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "news api body unreadable");
                counter!("source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        match Self::parse_response(&self.name, &body, limit) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "news api payload undecodable");
                counter!("source_errors_total").increment(1);
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
