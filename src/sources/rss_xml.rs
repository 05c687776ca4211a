// src/sources/rss_xml.rs
use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::sources::types::{Article, SourceAdapter};
use crate::sources::{normalize_text, parse_feed_date};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

/// RSS/XML feed adapter. Fixture mode parses a captured document (tests,
/// offline runs); HTTP mode fetches the feed per call. Known category labels
/// can map to per-category feed URLs; everything else uses the default feed.
pub struct RssAdapter {
    name: String,
    mode: Mode,
    category_feeds: HashMap<String, String>,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssAdapter {
    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
            category_feeds: HashMap::new(),
        }
    }

    pub fn from_fixture(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(content.to_string()),
            category_feeds: HashMap::new(),
        }
    }

    pub fn with_category_feed(mut self, category: &str, url: &str) -> Self {
        self.category_feeds
            .insert(category.to_ascii_lowercase(), url.to_string());
        self
    }

    fn feed_url_for<'a>(&'a self, default_url: &'a str, category: &str) -> &'a str {
        self.category_feeds
            .get(&category.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(default_url)
    }

    /// Map `<item>` elements to articles, bounded to `limit`, document order.
    /// Pure over the XML string so both modes (and tests) share it.
    pub fn parse_items(name: &str, xml: &str, limit: usize) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        let rss: Rss = from_str(xml).context("parsing rss xml")?;
        let mut out = Vec::with_capacity(rss.channel.item.len().min(limit));

        for it in rss.channel.item {
            if out.len() >= limit {
                break;
            }
            let article = Article {
                title: normalize_text(it.title.as_deref().unwrap_or_default()),
                description: normalize_text(it.description.as_deref().unwrap_or_default()),
                url: it.link.unwrap_or_default().trim().to_string(),
                source: name.to_string(),
                published_at: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_feed_date)
                    .unwrap_or_else(chrono::Utc::now),
                image: it.enclosure.and_then(|e| e.url),
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

    fn degrade(&self, err: anyhow::Error, stage: &str) -> Vec<Article> {
        tracing::warn!(error = ?err, source = %self.name, stage, "rss adapter degraded to empty");
        counter!("source_errors_total").increment(1);
        Vec::new()
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self, category: &str, limit: usize) -> Result<Vec<Article>> {
        crate::sources::ensure_metrics_described();

        match &self.mode {
            Mode::Fixture(content) => Ok(Self::parse_items(&self.name, content, limit)
                .unwrap_or_else(|e| self.degrade(e, "parse"))),
            Mode::Http { url, client } => {
                let feed_url = self.feed_url_for(url, category);
                let resp = match client.get(feed_url).send().await {
                    Ok(r) => r,
                    Err(e) => return Ok(self.degrade(e.into(), "fetch")),
                };
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        source = %self.name,
                        "rss feed returned non-success"
                    );
                    counter!("source_errors_total").increment(1);
                    return Ok(Vec::new());
                }
                let body = match resp.text().await {
                    Ok(b) => b,
                    Err(e) => return Ok(self.degrade(e.into(), "read body")),
                };
                Ok(Self::parse_items(&self.name, &body, limit)
                    .unwrap_or_else(|e| self.degrade(e, "parse")))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
