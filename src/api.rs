// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::aggregate::Aggregator;
use crate::snapshot::{LandingSnapshot, SnapshotCache};
use crate::sources::rss_xml::RssAdapter;
use crate::sources::types::{Article, SourceAdapter};

const DEFAULT_NEWS_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub snapshot: Arc<SnapshotCache>,
    /// Shared upstream client, reused by the ad-hoc /rss preview adapter.
    pub http_client: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news))
        .route("/rss", get(rss_preview))
        .route(
            "/landing-news",
            get(landing_news).post(landing_news_refresh),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct NewsResp {
    success: bool,
    count: usize,
    message: String,
    articles: Vec<Article>,
}

#[derive(serde::Serialize)]
struct RssResp {
    success: bool,
    count: usize,
    articles: Vec<Article>,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    success: bool,
    error: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LandingResp {
    success: bool,
    generated_at: DateTime<Utc>,
    articles: Vec<Article>,
}

/// Query params are parsed leniently: missing or unparsable values fall back
/// to defaults; the read path never 4xxes over them.
async fn news(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<NewsResp> {
    let category = q
        .get("category")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "general".to_string());
    let limit = q
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NEWS_LIMIT)
        .max(1);
    let with_content = q
        .get("full_content")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let outcome = state
        .aggregator
        .aggregate(&category, limit, with_content)
        .await;
    Json(NewsResp {
        success: true,
        count: outcome.articles.len(),
        message: format!(
            "{} articles from {} of {} sources",
            outcome.articles.len(),
            outcome.sources_contributing,
            outcome.sources_total
        ),
        articles: outcome.articles,
    })
}

/// Ad-hoc feed preview. The missing-url case is the one caller input error
/// that is not swallowed.
async fn rss_preview(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let Some(feed_url) = q
        .get("url")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResp {
                success: false,
                error: "URL parameter is required".to_string(),
            }),
        )
            .into_response();
    };
    let limit = q
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NEWS_LIMIT)
        .max(1);

    let adapter = RssAdapter::from_url("Custom feed", &feed_url, state.http_client.clone());
    // An unreachable or malformed feed is an empty preview, not an error.
    let articles = adapter.fetch("", limit).await.unwrap_or_default();

    Json(RssResp {
        success: true,
        count: articles.len(),
        articles,
    })
    .into_response()
}

async fn landing_news(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let force = q.get("refresh").map(|v| v == "true").unwrap_or(false);
    match state.snapshot.get(force).await {
        Ok(snapshot) => landing_response(StatusCode::OK, &snapshot),
        // Read path favors graceful degradation over hard failure.
        Err(e) => Json(ErrorResp {
            success: false,
            error: e.to_string(),
        })
        .into_response(),
    }
}

/// Unconditional forced refresh; a failure here is an explicit outcome and
/// the previously stored snapshot stays in place.
async fn landing_news_refresh(State(state): State<AppState>) -> Response {
    match state.snapshot.get(true).await {
        Ok(snapshot) => landing_response(StatusCode::OK, &snapshot),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResp {
                success: false,
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

fn landing_response(status: StatusCode, snapshot: &LandingSnapshot) -> Response {
    (
        status,
        Json(LandingResp {
            success: true,
            generated_at: snapshot.generated_at,
            articles: snapshot.articles.clone(),
        }),
    )
        .into_response()
}
