// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod categorize;
pub mod config;
pub mod metrics;
pub mod scrape;
pub mod snapshot;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateOutcome, Aggregator};
pub use crate::api::{router, AppState};
pub use crate::categorize::Categorizer;
pub use crate::scrape::ContentScraper;
pub use crate::snapshot::{
    Clock, LandingSnapshot, LandingSource, SnapshotCache, SnapshotSource, SystemClock,
};
pub use crate::sources::types::{Article, SourceAdapter};
