//! Derived views over the fetched activity
//!
//! Everything here is recomputed from the raw inputs on demand:
//! - [`aggregate`]: filtering, per-user grouping, chart series, heatmap
//! - [`leaderboard`]: sortable, searchable, paginated table of users
//! - [`insights`]: top-N rankings, activity chart and heatmap for a period
//!
//! The two view models keep independent filter state but share the same
//! aggregator, so the same filters always produce the same numbers.

pub mod aggregate;
pub mod insights;
pub mod leaderboard;

pub use aggregate::{
    aggregate, aggregate_events, build_snapshot, chart_window, daily_counts, filter_events, ChartSeries, Heatmap,
    ALL_TIME_CHART_DAYS, MAX_CHART_DAYS,
};
pub use insights::{
    rank_authors, rank_posts, AnalyticsFrame, AnalyticsSnapshot, AnalyticsSummary, AnalyticsView,
    TopPost, EXCERPT_CHARS, TOP_N,
};
pub use leaderboard::{
    LeaderboardFrame, LeaderboardInputs, LeaderboardSource, LeaderboardView, Totals, PAGE_SIZE,
};
