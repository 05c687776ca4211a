//! Newswire Aggregator — Binary Entrypoint
//! Boots the Axum HTTP server, wiring source adapters, shared state, and
//! middleware.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswire_aggregator::aggregate::Aggregator;
use newswire_aggregator::api::{self, AppState};
use newswire_aggregator::categorize::Categorizer;
use newswire_aggregator::config::AppConfig;
use newswire_aggregator::metrics::Metrics;
use newswire_aggregator::scrape::ContentScraper;
use newswire_aggregator::snapshot::{LandingSource, SnapshotCache, SystemClock};
use newswire_aggregator::sources::default_adapters;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - AGGREGATOR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("AGGREGATOR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newswire_aggregator=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This is how
    // GNEWS_API_KEY and the LANDING_* tunables reach AppConfig.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let metrics = Metrics::init(cfg.adapter_timeout.as_secs());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("building upstream http client");

    let categorizer = Categorizer::load_default().unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "categories config unreadable, using compiled defaults");
        Categorizer::with_defaults()
    });

    let adapters = default_adapters(&cfg, &client);
    let aggregator = Arc::new(
        Aggregator::new(
            adapters,
            categorizer,
            ContentScraper::with_delay(cfg.scrape_delay),
        )
        .with_tuning(cfg.overfetch_factor, cfg.adapter_timeout),
    );

    let landing = LandingSource {
        aggregator: Arc::clone(&aggregator),
        category: cfg.landing_category.clone(),
        limit: cfg.landing_limit,
    };
    let snapshot = Arc::new(SnapshotCache::new(Arc::new(landing), Arc::new(SystemClock)));

    let state = AppState {
        aggregator,
        snapshot,
        http_client: client,
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
