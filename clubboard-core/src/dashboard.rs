//! Composition root: owns the stores and both view models
//!
//! All recomputation happens synchronously on whoever owns the
//! [`Dashboard`]. Background fetches only produce [`Update`]s; applying one
//! replaces a store slot, refreshes both views and notifies the render sinks.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::analytics::{
    AnalyticsFrame, AnalyticsView, LeaderboardFrame, LeaderboardInputs, LeaderboardView,
};
use crate::config::Config;
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::fetch::Update;
use crate::store::{EventStore, SnapshotStore};
use crate::types::{
    normalize_handle, Event, HourFilter, Metric, PostMetric, SortSpec, TimeFilter, UserAggregate,
};

/// Receives frames whenever a view changes. Every method defaults to a no-op.
pub trait RenderSink {
    fn leaderboard(&mut self, _frame: &LeaderboardFrame) {}

    fn analytics(&mut self, _frame: &AnalyticsFrame) {}

    /// A user row was expanded (`Some`) or collapsed (`None`).
    fn user_detail(&mut self, _username: &str, _events: Option<&[&Event]>) {}
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct Dashboard {
    events: EventStore,
    snapshot: SnapshotStore,
    leaderboard: LeaderboardView,
    analytics: AnalyticsView,
    expanded: Option<String>,
    clock: Clock,
    sinks: Vec<Box<dyn RenderSink>>,
}

impl Dashboard {
    /// Empty dashboard with view defaults taken from `config`.
    pub fn new(config: &Config) -> Self {
        let mut analytics = AnalyticsView::new(config.analytics.period);
        analytics.set_author_metric(config.analytics.author_metric);
        analytics.set_post_metric(config.analytics.post_metric);

        let mut dashboard = Self {
            events: EventStore::default(),
            snapshot: SnapshotStore::default(),
            leaderboard: LeaderboardView::new(
                config.leaderboard.source,
                config.leaderboard.time_filter,
            ),
            analytics,
            expanded: None,
            clock: Box::new(Utc::now),
            sinks: Vec::new(),
        };
        if !config.analytics.hour.is_all() {
            let now = dashboard.now();
            dashboard
                .analytics
                .set_hour(config.analytics.hour, dashboard.events.items(), now);
        }
        dashboard
    }

    /// Replace the wall clock, e.g. with a fixed instant in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sinks.push(sink);
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ============================================
    // Inputs
    // ============================================

    /// Apply a fetch result: replace the matching store, recompute, notify.
    pub fn apply(&mut self, update: Update) {
        let now = self.now();
        match update {
            Update::Events(events) => {
                tracing::info!(events = events.len(), "Activity log replaced");
                self.events.replace(events, now);
            }
            Update::Snapshot(rows) => {
                tracing::info!(rows = rows.len(), "Leaderboard snapshot replaced");
                self.snapshot.replace(rows, now);
            }
        }
        self.refresh();
    }

    /// Recompute both views against the current clock.
    pub fn refresh(&mut self) {
        let now = self.now();
        let inputs = LeaderboardInputs {
            events: self.events.items(),
            snapshot: self.snapshot.items(),
            now,
        };
        self.leaderboard.refresh(&inputs);
        self.analytics.refresh(self.events.items(), now);

        self.notify_leaderboard();
        self.notify_analytics();
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    // ============================================
    // Leaderboard
    // ============================================

    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    /// Current table frame, stamped with the fetch time of its input.
    pub fn leaderboard_frame(&self) -> LeaderboardFrame {
        let mut frame = self.leaderboard.frame();
        frame.updated_at = if self.leaderboard.reads_snapshot() {
            self.snapshot.fetched_at()
        } else {
            self.events.fetched_at()
        };
        frame
    }

    pub fn set_sort(&mut self, key: Metric) {
        self.leaderboard.set_sort(key);
        self.notify_leaderboard();
    }

    pub fn set_sort_spec(&mut self, spec: SortSpec) {
        self.leaderboard.set_sort_spec(spec);
        self.notify_leaderboard();
    }

    pub fn set_search(&mut self, query: &str) {
        self.leaderboard.set_search(query);
        self.notify_leaderboard();
    }

    pub fn set_time_filter(&mut self, filter: TimeFilter) {
        let now = self.now();
        let inputs = LeaderboardInputs {
            events: self.events.items(),
            snapshot: self.snapshot.items(),
            now,
        };
        self.leaderboard.set_time_filter(filter, &inputs);
        self.notify_leaderboard();
    }

    pub fn page(&mut self, n: usize) {
        self.leaderboard.page(n);
        self.notify_leaderboard();
    }

    pub fn next_page(&mut self) {
        self.leaderboard.next_page();
        self.notify_leaderboard();
    }

    pub fn prev_page(&mut self) {
        self.leaderboard.prev_page();
        self.notify_leaderboard();
    }

    /// Every event by `username` (identity-key match), in source order.
    pub fn user_events(&self, username: &str) -> Vec<&Event> {
        let key = normalize_handle(username);
        self.events
            .items()
            .iter()
            .filter(|e| e.username == key)
            .collect()
    }

    /// Expand a user's row, collapsing any other. Expanding the same user
    /// again collapses it and returns `None`.
    pub fn toggle_user(&mut self, username: &str) -> Option<Vec<&Event>> {
        let key = normalize_handle(username);
        if self.expanded.as_deref() == Some(key.as_str()) {
            self.expanded = None;
            for sink in &mut self.sinks {
                sink.user_detail(&key, None);
            }
            return None;
        }

        let events: Vec<&Event> = self.events.items().iter().filter(|e| e.username == key).collect();
        for sink in &mut self.sinks {
            sink.user_detail(&key, Some(&events));
        }
        self.expanded = Some(key);
        Some(events)
    }

    pub fn expanded_user(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    /// Aggregate row for one user under the leaderboard's time filter.
    pub fn user_row(&self, username: &str) -> Option<&UserAggregate> {
        let key = normalize_handle(username);
        self.leaderboard.rows().iter().find(|row| row.username == key)
    }

    // ============================================
    // Analytics
    // ============================================

    pub fn analytics(&self) -> &AnalyticsView {
        &self.analytics
    }

    pub fn analytics_frame(&self) -> AnalyticsFrame {
        self.analytics.frame()
    }

    pub fn set_period(&mut self, period: TimeFilter) {
        let now = self.now();
        self.analytics.set_period(period, self.events.items(), now);
        self.notify_analytics();
    }

    pub fn set_hour(&mut self, hour: HourFilter) {
        let now = self.now();
        self.analytics.set_hour(hour, self.events.items(), now);
        self.notify_analytics();
    }

    pub fn set_author_metric(&mut self, metric: Metric) {
        self.analytics.set_author_metric(metric);
        self.notify_analytics();
    }

    pub fn set_post_metric(&mut self, metric: PostMetric) {
        self.analytics.set_post_metric(metric);
        self.notify_analytics();
    }

    /// Write the last analytics snapshot to `dir`.
    pub fn export(&self, dir: &Path, format: ExportFormat) -> Result<PathBuf> {
        export::save(dir, format, self.analytics.snapshot(), self.now())
    }

    fn notify_leaderboard(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        let frame = self.leaderboard_frame();
        for sink in &mut self.sinks {
            sink.leaderboard(&frame);
        }
    }

    fn notify_analytics(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        let frame = self.analytics.frame();
        for sink in &mut self.sinks {
            sink.analytics(&frame);
        }
    }
}
