// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /news (response shape, camelCase article fields)
// - GET /rss without url -> 400 with the exact error body
// - GET/POST /landing-news (snapshot stability and forced refresh)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use newswire_aggregator::aggregate::Aggregator;
use newswire_aggregator::api::{self, AppState};
use newswire_aggregator::categorize::Categorizer;
use newswire_aggregator::scrape::ContentScraper;
use newswire_aggregator::snapshot::{LandingSource, SnapshotCache, SystemClock};
use newswire_aggregator::sources::types::{Article, SourceAdapter};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct FixedAdapter;

#[async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self, _category: &str, limit: usize) -> Result<Vec<Article>> {
        let items = vec![
            Article {
                title: "Football league results".to_string(),
                description: "Weekend roundup".to_string(),
                url: "https://fixed.example/sports".to_string(),
                source: "Fixed".to_string(),
                published_at: Utc::now(),
                image: None,
                full_content: None,
            },
            Article {
                title: "Quiet day elsewhere".to_string(),
                description: String::new(),
                url: "https://fixed.example/quiet".to_string(),
                source: "Fixed".to_string(),
                published_at: Utc::now(),
                image: None,
                full_content: None,
            },
        ];
        Ok(items.into_iter().take(limit).collect())
    }
    fn name(&self) -> &str {
        "Fixed"
    }
}

/// Build the same Router the binary uses, wired to a mock adapter so no
/// request leaves the process.
fn test_router() -> Router {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(FixedAdapter)];
    let aggregator = Arc::new(
        Aggregator::new(
            adapters,
            Categorizer::with_defaults(),
            ContentScraper::with_delay(Duration::ZERO),
        )
        .with_tuning(2.0, Duration::from_millis(500)),
    );
    let landing = LandingSource {
        aggregator: Arc::clone(&aggregator),
        category: "general".to_string(),
        limit: 5,
    };
    let snapshot = Arc::new(SnapshotCache::new(Arc::new(landing), Arc::new(SystemClock)));
    api::router(AppState {
        aggregator,
        snapshot,
        http_client: reqwest::Client::new(),
    })
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse json body");
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_news_returns_expected_json_shape() {
    let app = test_router();
    let (status, v) = get_json(&app, "/news?category=general&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v.get("success"), Some(&Json::Bool(true)));
    assert!(v.get("message").is_some(), "missing 'message'");

    let articles = v
        .get("articles")
        .and_then(|a| a.as_array())
        .expect("articles array");
    assert_eq!(v.get("count").and_then(Json::as_u64), Some(articles.len() as u64));

    // Wire contract for the presentation layer: camelCase fields.
    let first = &articles[0];
    assert!(first.get("title").is_some());
    assert!(first.get("url").is_some());
    assert!(first.get("source").is_some());
    assert!(first.get("publishedAt").is_some(), "missing 'publishedAt'");
}

#[tokio::test]
async fn api_news_category_filter_applies() {
    let app = test_router();
    let (status, v) = get_json(&app, "/news?category=sports&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    let articles = v
        .get("articles")
        .and_then(|a| a.as_array())
        .expect("articles array");
    assert_eq!(articles.len(), 1);
    assert_eq!(
        articles[0].get("title").and_then(Json::as_str),
        Some("Football league results")
    );
}

#[tokio::test]
async fn api_rss_without_url_is_a_400_with_error_body() {
    let app = test_router();
    let (status, v) = get_json(&app, "/rss").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v.get("success"), Some(&Json::Bool(false)));
    assert_eq!(
        v.get("error").and_then(Json::as_str),
        Some("URL parameter is required")
    );
}

#[tokio::test]
async fn api_landing_news_is_stable_until_refreshed() {
    let app = test_router();

    let (s1, v1) = get_json(&app, "/landing-news").await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(v1.get("success"), Some(&Json::Bool(true)));
    let first_stamp = v1
        .get("generatedAt")
        .and_then(Json::as_str)
        .expect("generatedAt present")
        .to_string();

    // Unforced read returns the cached snapshot bit-for-bit.
    let (s2, v2) = get_json(&app, "/landing-news").await;
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(
        v2.get("generatedAt").and_then(Json::as_str),
        Some(first_stamp.as_str())
    );

    assert!(v1.get("articles").and_then(|a| a.as_array()).is_some());
}

#[tokio::test]
async fn api_landing_news_post_forces_a_refresh() {
    let app = test_router();

    let (_, v1) = get_json(&app, "/landing-news").await;
    let first_stamp = v1
        .get("generatedAt")
        .and_then(Json::as_str)
        .expect("generatedAt present")
        .to_string();

    let req = Request::builder()
        .method("POST")
        .uri("/landing-news")
        .body(Body::empty())
        .expect("build POST /landing-news");
    let resp = app.clone().oneshot(req).await.expect("oneshot POST");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v2: Json = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v2.get("success"), Some(&Json::Bool(true)));

    let second_stamp = v2
        .get("generatedAt")
        .and_then(Json::as_str)
        .expect("generatedAt present");
    assert_ne!(second_stamp, first_stamp, "forced refresh must supersede");
}
