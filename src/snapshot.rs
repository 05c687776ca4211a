// src/snapshot.rs
//! # Snapshot Cache
//! Single-line cache for the landing page aggregation result.
//!
//! The cache owns exactly one current snapshot. Reads clone an `Arc`;
//! a refresh builds a brand-new snapshot and replaces the whole value, so
//! readers never observe a partially constructed one. Overlapping refreshes
//! serialize on an async gate.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;

use crate::aggregate::Aggregator;
use crate::sources::types::Article;

/// Injected clock so refresh timing is testable without wall-clock waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Immutable once built; a refresh supersedes it rather than mutating it.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingSnapshot {
    pub generated_at: DateTime<Utc>,
    pub articles: Vec<Article>,
}

/// What a refresh runs to produce the article list.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn build(&self) -> Result<Vec<Article>>;
}

/// Production source: one aggregation pass with the fixed landing defaults.
pub struct LandingSource {
    pub aggregator: Arc<Aggregator>,
    pub category: String,
    pub limit: usize,
}

#[async_trait]
impl SnapshotSource for LandingSource {
    async fn build(&self) -> Result<Vec<Article>> {
        let outcome = self
            .aggregator
            .aggregate(&self.category, self.limit, false)
            .await;
        Ok(outcome.articles)
    }
}

pub struct SnapshotCache {
    source: Arc<dyn SnapshotSource>,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Arc<LandingSnapshot>>>,
    /// Single-writer gate; overlapping refresh requests wait here and the
    /// later one reads or rebuilds in a defined order.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn SnapshotSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            current: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn current(&self) -> Option<Arc<LandingSnapshot>> {
        self.current.read().expect("snapshot rwlock poisoned").clone()
    }

    /// Cache-hit is the default path; `force` (or an empty cache) runs the
    /// source and atomically replaces the stored snapshot. A failed refresh
    /// leaves the previous snapshot untouched.
    pub async fn get(&self, force: bool) -> Result<Arc<LandingSnapshot>> {
        if !force {
            if let Some(snapshot) = self.current() {
                counter!("snapshot_hits_total").increment(1);
                return Ok(snapshot);
            }
        }

        let _gate = self.refresh_gate.lock().await;

        // A racer may have populated the cache while we waited for the gate.
        if !force {
            if let Some(snapshot) = self.current() {
                counter!("snapshot_hits_total").increment(1);
                return Ok(snapshot);
            }
        }

        let articles = self.source.build().await?;
        let snapshot = Arc::new(LandingSnapshot {
            generated_at: self.clock.now(),
            articles,
        });
        *self.current.write().expect("snapshot rwlock poisoned") = Some(Arc::clone(&snapshot));
        counter!("snapshot_refresh_total").increment(1);

        Ok(snapshot)
    }
}
