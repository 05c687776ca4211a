// src/aggregate.rs
//! # Aggregator
//! Concurrent fan-out across the configured source adapters, then
//! merge → dedup → category filter → truncate → optional content scrape.
//!
//! A single adapter's failure or timeout never aborts the pass; the call
//! always produces a result, possibly empty.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::categorize::Categorizer;
use crate::scrape::ContentScraper;
use crate::sources::types::{Article, SourceAdapter};

pub const DEFAULT_OVERFETCH_FACTOR: f64 = 2.0;
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(12);

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregate_runs_total", "Completed aggregation passes.");
        describe_counter!(
            "aggregate_adapter_errors_total",
            "Adapter calls that returned an error to the aggregator."
        );
        describe_counter!(
            "aggregate_adapter_timeouts_total",
            "Adapter calls cancelled by the per-adapter time bound."
        );
        describe_counter!(
            "aggregate_articles_merged_total",
            "Articles collected across adapters before dedup."
        );
        describe_counter!(
            "aggregate_articles_deduped_total",
            "Articles dropped as invalid or duplicate during merge."
        );
    });
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    categorizer: Categorizer,
    scraper: ContentScraper,
    /// Adapters are asked for `limit × factor` items to compensate for
    /// post-filter attrition.
    overfetch_factor: f64,
    adapter_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub articles: Vec<Article>,
    /// Adapters that returned at least one article this pass.
    pub sources_contributing: usize,
    pub sources_total: usize,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        categorizer: Categorizer,
        scraper: ContentScraper,
    ) -> Self {
        Self {
            adapters,
            categorizer,
            scraper,
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_tuning(mut self, overfetch_factor: f64, adapter_timeout: Duration) -> Self {
        self.overfetch_factor = overfetch_factor.max(1.0);
        self.adapter_timeout = adapter_timeout;
        self
    }

    pub async fn aggregate(
        &self,
        category: &str,
        limit: usize,
        with_content: bool,
    ) -> AggregateOutcome {
        ensure_metrics_described();

        let limit = limit.max(1);
        let per_source = ((limit as f64) * self.overfetch_factor).ceil() as usize;

        let fetches = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let timeout = self.adapter_timeout;
            let category = category.to_string();
            async move {
                match tokio::time::timeout(timeout, adapter.fetch(&category, per_source)).await {
                    Ok(Ok(items)) => items,
                    Ok(Err(e)) => {
                        tracing::warn!(error = ?e, source = adapter.name(), "adapter error");
                        counter!("aggregate_adapter_errors_total").increment(1);
                        Vec::new()
                    }
                    Err(_) => {
                        tracing::warn!(
                            source = adapter.name(),
                            timeout_ms = timeout.as_millis() as u64,
                            "adapter timed out"
                        );
                        counter!("aggregate_adapter_timeouts_total").increment(1);
                        Vec::new()
                    }
                }
            }
        });
        // join_all keeps adapter order, which keeps the merge deterministic.
        let batches = futures::future::join_all(fetches).await;

        let sources_total = batches.len();
        let sources_contributing = batches.iter().filter(|b| !b.is_empty()).count();

        let merged: Vec<Article> = batches.into_iter().flatten().collect();
        counter!("aggregate_articles_merged_total").increment(merged.len() as u64);

        let unique = dedup_by_key(merged);
        let filtered = self.categorizer.filter(unique, category);
        let mut articles: Vec<Article> = filtered.into_iter().take(limit).collect();

        if with_content {
            self.scraper.scrape_all(&mut articles).await;
        }

        counter!("aggregate_runs_total").increment(1);
        tracing::info!(
            target: "aggregate",
            category = %category,
            kept = articles.len(),
            contributing = sources_contributing,
            total = sources_total,
            "aggregation pass"
        );

        AggregateOutcome {
            articles,
            sources_contributing,
            sources_total,
        }
    }
}

/// Dedup key: lower-cased, trailing-slash-trimmed url; lower-cased title for
/// the rare url-less article.
pub fn canonical_key(article: &Article) -> String {
    let url = article.url.trim();
    if !url.is_empty() {
        let mut key = url.to_ascii_lowercase();
        while key.ends_with('/') {
            key.pop();
        }
        key
    } else {
        format!("title:{}", article.title.trim().to_lowercase())
    }
}

/// First-seen occurrence wins; invalid articles are dropped up front.
pub fn dedup_by_key(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
    let mut out = Vec::with_capacity(articles.len());
    let mut dropped = 0usize;

    for article in articles {
        if !article.is_valid() {
            dropped += 1;
            continue;
        }
        if seen.insert(canonical_key(&article)) {
            out.push(article);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        counter!("aggregate_articles_deduped_total").increment(dropped as u64);
    }
    out
}
