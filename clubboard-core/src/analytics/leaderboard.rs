//! Leaderboard view model: sorting, search and pagination over per-user rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::aggregate;
use crate::types::{
    normalize_handle, Event, HourFilter, Metric, SortOrder, SortSpec, TimeFilter, UserAggregate,
};

/// Rows per page.
pub const PAGE_SIZE: usize = 15;

/// Where leaderboard rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardSource {
    /// Always aggregate the activity log
    #[default]
    Events,
    /// Show the precomputed snapshot for "all time", aggregate the log for windows
    Snapshot,
}

/// Everything the leaderboard derives its rows from.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardInputs<'a> {
    pub events: &'a [Event],
    pub snapshot: &'a [UserAggregate],
    pub now: DateTime<Utc>,
}

/// Header totals. Reflect the time filter, never the search box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub posts: u64,
    pub views: u64,
    pub users: usize,
}

impl Totals {
    fn from_rows(rows: &[UserAggregate]) -> Self {
        Self {
            posts: rows.iter().map(|r| r.posts).sum(),
            views: rows.iter().map(|r| r.views).sum(),
            users: rows.len(),
        }
    }
}

/// What a renderer needs to paint the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardFrame {
    /// Rows on the current page
    pub rows: Vec<UserAggregate>,
    /// Rank of the first row on this page (1-based)
    pub first_rank: usize,
    pub current_page: usize,
    pub total_pages: usize,
    /// Rows matching the search box
    pub filtered_count: usize,
    pub sort: SortSpec,
    pub search: String,
    pub time_filter: TimeFilter,
    pub totals: Totals,
    /// When the input backing these rows was last fetched
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sort, search and pagination state over the aggregated rows.
#[derive(Debug, Clone)]
pub struct LeaderboardView {
    source: LeaderboardSource,
    time_filter: TimeFilter,
    sort: SortSpec,
    search: String,
    current_page: usize,
    /// Time-filtered rows, kept in sorted order
    rows: Vec<UserAggregate>,
    totals: Totals,
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::new(LeaderboardSource::default(), TimeFilter::default())
    }
}

impl LeaderboardView {
    pub fn new(source: LeaderboardSource, time_filter: TimeFilter) -> Self {
        Self {
            source,
            time_filter,
            sort: SortSpec::default(),
            search: String::new(),
            current_page: 1,
            rows: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Recompute rows for the current time filter (e.g. after new data arrived).
    ///
    /// Keeps the current page, clamped to the new page count.
    pub fn refresh(&mut self, inputs: &LeaderboardInputs<'_>) {
        self.rows = if self.reads_snapshot() {
            inputs.snapshot.to_vec()
        } else {
            aggregate(inputs.events, self.time_filter, HourFilter::All, inputs.now)
        };
        self.totals = Totals::from_rows(&self.rows);
        self.sort_rows();
        self.clamp_page();

        tracing::debug!(
            rows = self.rows.len(),
            time_filter = %self.time_filter,
            "Leaderboard recomputed"
        );
    }

    /// Switch the time window, recompute, and go back to page 1.
    pub fn set_time_filter(&mut self, filter: TimeFilter, inputs: &LeaderboardInputs<'_>) {
        self.time_filter = filter;
        self.current_page = 1;
        self.refresh(inputs);
    }

    /// Sort by `key`. Selecting the active key flips the direction; a new key starts descending.
    pub fn set_sort(&mut self, key: Metric) {
        if self.sort.key == key {
            self.sort.order = self.sort.order.flipped();
        } else {
            self.sort = SortSpec {
                key,
                order: SortOrder::Desc,
            };
        }
        self.sort_rows();
    }

    /// Set key and direction outright, without toggling.
    pub fn set_sort_spec(&mut self, spec: SortSpec) {
        self.sort = spec;
        self.sort_rows();
    }

    /// Filter rows by a case-insensitive substring of the username. Resets to page 1.
    pub fn set_search(&mut self, query: &str) {
        self.search = normalize_handle(query);
        self.current_page = 1;
    }

    /// Jump to page `n`, clamped to the valid range.
    pub fn page(&mut self, n: usize) {
        self.current_page = n.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.page(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.page(self.current_page.saturating_sub(1));
    }

    /// Rows matching the search box, in sort order.
    pub fn filtered_rows(&self) -> Vec<&UserAggregate> {
        self.rows
            .iter()
            .filter(|row| self.search.is_empty() || row.username.contains(&self.search))
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        if self.search.is_empty() {
            self.rows.len()
        } else {
            self.filtered_rows().len()
        }
    }

    /// `max(1, ceil(filtered / PAGE_SIZE))`
    pub fn total_pages(&self) -> usize {
        self.filtered_count().div_ceil(PAGE_SIZE).max(1)
    }

    /// The current page slice of the sorted, searched rows.
    pub fn visible_rows(&self) -> Vec<&UserAggregate> {
        let start = (self.current_page - 1) * PAGE_SIZE;
        self.filtered_rows()
            .into_iter()
            .skip(start)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    pub fn source(&self) -> LeaderboardSource {
        self.source
    }

    /// All time-filtered rows in sort order, ignoring search.
    pub fn rows(&self) -> &[UserAggregate] {
        &self.rows
    }

    /// Snapshot of everything the table renderer needs.
    /// Whether rows come from the snapshot rather than the activity log.
    pub fn reads_snapshot(&self) -> bool {
        self.source == LeaderboardSource::Snapshot && self.time_filter == TimeFilter::All
    }

    pub fn frame(&self) -> LeaderboardFrame {
        LeaderboardFrame {
            rows: self.visible_rows().into_iter().cloned().collect(),
            first_rank: (self.current_page - 1) * PAGE_SIZE + 1,
            current_page: self.current_page,
            total_pages: self.total_pages(),
            filtered_count: self.filtered_count(),
            sort: self.sort,
            search: self.search.clone(),
            time_filter: self.time_filter,
            totals: self.totals,
            updated_at: None,
        }
    }

    // Stable, so equal values keep their relative order across direction flips.
    fn sort_rows(&mut self) {
        let SortSpec { key, order } = self.sort;
        self.rows.sort_by(|a, b| match order {
            SortOrder::Asc => a.metric(key).cmp(&b.metric(key)),
            SortOrder::Desc => b.metric(key).cmp(&a.metric(key)),
        });
    }

    fn clamp_page(&mut self) {
        self.current_page = self.current_page.clamp(1, self.total_pages());
    }
}
