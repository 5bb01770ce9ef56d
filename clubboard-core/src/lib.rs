//! # clubboard-core
//!
//! Core library for clubboard - a community leaderboard and activity
//! analytics dashboard.
//!
//! This library provides:
//! - Domain types for events, per-user aggregates, filters and sorting
//! - Tolerant ingestion of the leaderboard snapshot and the activity log
//! - The aggregator and the leaderboard / analytics view models
//! - CSV and JSON export
//! - A fetch client and a restartable background poller
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! ```text
//! fetch ──► store ──► aggregator(time, hour) ──► { leaderboard, analytics } ──► render sinks
//! ```
//!
//! Every view is recomputed from the raw events on demand; nothing derived
//! is persisted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use clubboard_core::{Config, Dashboard, DataClient, Update};
//!
//! # async fn run() -> clubboard_core::Result<()> {
//! let config = Config::load()?;
//! let client = DataClient::new(&config.sources)?;
//!
//! let mut dashboard = Dashboard::new(&config);
//! dashboard.apply(Update::Events(client.fetch_events().await?.events));
//! dashboard.apply(Update::Snapshot(client.fetch_snapshot().await?));
//!
//! for row in dashboard.leaderboard().visible_rows() {
//!     println!("{} {}", row.username, row.posts);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{
    AnalyticsFrame, AnalyticsSnapshot, AnalyticsView, LeaderboardFrame, LeaderboardSource,
    LeaderboardView,
};
pub use config::Config;
pub use dashboard::{Dashboard, RenderSink};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use fetch::{DataClient, Poller, Source, Update};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod fetch;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod store;
pub mod types;
