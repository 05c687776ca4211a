// tests/aggregate_pipeline.rs
//
// Aggregator behavior with mock adapters: partial failure isolation,
// deterministic merge order, dedup, category filtering, truncation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use newswire_aggregator::aggregate::Aggregator;
use newswire_aggregator::categorize::Categorizer;
use newswire_aggregator::scrape::ContentScraper;
use newswire_aggregator::sources::types::{Article, SourceAdapter};

fn article(title: &str, url: &str) -> Article {
    Article {
        title: title.to_string(),
        description: String::new(),
        url: url.to_string(),
        source: "Mock".to_string(),
        published_at: Utc::now(),
        image: None,
        full_content: None,
    }
}

struct FixedAdapter {
    name: &'static str,
    items: Vec<Article>,
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self, _category: &str, limit: usize) -> Result<Vec<Article>> {
        Ok(self.items.iter().take(limit).cloned().collect())
    }
    fn name(&self) -> &str {
        self.name
    }
}

/// Never answers within the aggregator's time bound.
struct StalledAdapter;

#[async_trait]
impl SourceAdapter for StalledAdapter {
    async fn fetch(&self, _category: &str, _limit: usize) -> Result<Vec<Article>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![article("too late", "https://slow.example/item")])
    }
    fn name(&self) -> &str {
        "Stalled"
    }
}

struct FailingAdapter;

#[async_trait]
impl SourceAdapter for FailingAdapter {
    async fn fetch(&self, _category: &str, _limit: usize) -> Result<Vec<Article>> {
        Err(anyhow!("upstream exploded"))
    }
    fn name(&self) -> &str {
        "Failing"
    }
}

fn test_aggregator(adapters: Vec<Arc<dyn SourceAdapter>>) -> Aggregator {
    Aggregator::new(
        adapters,
        Categorizer::with_defaults(),
        ContentScraper::with_delay(Duration::ZERO),
    )
    .with_tuning(2.0, Duration::from_millis(200))
}

#[tokio::test]
async fn slow_and_duplicate_sources_still_produce_a_merged_result() {
    let a = FixedAdapter {
        name: "A",
        items: (1..=5)
            .map(|i| article(&format!("a{i}"), &format!("https://a.example/{i}")))
            .collect(),
    };
    // C's second item duplicates A's first up to case and a trailing slash.
    let c = FixedAdapter {
        name: "C",
        items: vec![
            article("c fresh", "https://c.example/fresh"),
            article("a1 again", "https://A.example/1/"),
        ],
    };

    let agg = test_aggregator(vec![Arc::new(a), Arc::new(StalledAdapter), Arc::new(c)]);
    let outcome = agg.aggregate("general", 10, false).await;

    assert_eq!(outcome.articles.len(), 6);
    assert_eq!(outcome.sources_contributing, 2);
    assert_eq!(outcome.sources_total, 3);

    // Merge order is adapter order: all of A, then C's non-duplicate.
    let titles: Vec<_> = outcome.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["a1", "a2", "a3", "a4", "a5", "c fresh"]);
}

#[tokio::test]
async fn failing_adapter_never_aborts_the_pass() {
    let ok = FixedAdapter {
        name: "OK",
        items: vec![article("fine", "https://ok.example/fine")],
    };
    let agg = test_aggregator(vec![Arc::new(FailingAdapter), Arc::new(ok)]);
    let outcome = agg.aggregate("general", 5, false).await;

    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.sources_contributing, 1);
}

#[tokio::test]
async fn all_sources_failing_is_an_empty_result_not_an_error() {
    let agg = test_aggregator(vec![Arc::new(FailingAdapter), Arc::new(StalledAdapter)]);
    let outcome = agg.aggregate("general", 5, false).await;

    assert!(outcome.articles.is_empty());
    assert_eq!(outcome.sources_contributing, 0);
    assert_eq!(outcome.sources_total, 2);
}

#[tokio::test]
async fn result_is_truncated_to_the_requested_limit() {
    let big = FixedAdapter {
        name: "Big",
        items: (1..=20)
            .map(|i| article(&format!("t{i}"), &format!("https://big.example/{i}")))
            .collect(),
    };
    let agg = test_aggregator(vec![Arc::new(big)]);
    let outcome = agg.aggregate("general", 3, false).await;
    assert_eq!(outcome.articles.len(), 3);
}

#[tokio::test]
async fn category_filter_applies_after_merge() {
    let mixed = FixedAdapter {
        name: "Mixed",
        items: vec![
            article("Football league results", "https://m.example/1"),
            article("Gardening on a budget", "https://m.example/2"),
            article("Tennis tournament upset", "https://m.example/3"),
        ],
    };
    let agg = test_aggregator(vec![Arc::new(mixed)]);
    let outcome = agg.aggregate("sports", 10, false).await;

    let titles: Vec<_> = outcome.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Football league results", "Tennis tournament upset"]
    );
}
