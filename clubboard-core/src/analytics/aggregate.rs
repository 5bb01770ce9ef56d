//! The aggregator: every per-user total, chart series and heatmap is derived here.
//!
//! All functions are pure. Rolling windows are evaluated against the `now`
//! passed in, so callers decide what "now" means (wall clock in the app,
//! a fixed instant in tests).

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::types::{Event, HourFilter, TimeFilter, UserAggregate};

/// Chart window used when the period is "all time".
pub const ALL_TIME_CHART_DAYS: u32 = 60;

/// Longest chart drawn for any period; longer windows chart their last ten years.
pub const MAX_CHART_DAYS: u32 = 3660;

/// Events passing the time filter, then the hour filter.
///
/// With both filters at `All` every event passes, including events whose
/// timestamp is missing or unparseable. Any active filter drops them.
pub fn filter_events<'a>(
    events: &'a [Event],
    time: TimeFilter,
    hour: HourFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|e| time.matches(e.created_at, now))
        .filter(|e| hour.matches(e.created_at))
        .collect()
}

/// Per-user totals over the events passing both filters.
pub fn aggregate(
    events: &[Event],
    time: TimeFilter,
    hour: HourFilter,
    now: DateTime<Utc>,
) -> Vec<UserAggregate> {
    aggregate_events(filter_events(events, time, hour, now))
}

/// Group already-filtered events by identity key.
///
/// Output order is the order in which each user first appears.
pub fn aggregate_events<'a, I>(events: I) -> Vec<UserAggregate>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut users: Vec<UserAggregate> = Vec::new();

    for event in events {
        let slot = *index.entry(event.username.as_str()).or_insert_with(|| {
            users.push(UserAggregate {
                username: event.username.clone(),
                ..Default::default()
            });
            users.len() - 1
        });
        users[slot].add_event(event);
    }

    users
}

/// All-time per-user totals in snapshot form: most posts first, ties in first-seen order.
pub fn build_snapshot(events: &[Event]) -> Vec<UserAggregate> {
    let mut rows = aggregate_events(events);
    rows.sort_by(|a, b| b.posts.cmp(&a.posts));
    rows
}

/// Number of trailing days charted for a period.
pub fn chart_window(period: TimeFilter) -> u32 {
    period
        .days()
        .unwrap_or(ALL_TIME_CHART_DAYS)
        .min(MAX_CHART_DAYS)
}

/// Post counts per UTC day, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// ISO dates (`YYYY-MM-DD`)
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
}

impl ChartSeries {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-day counts for the `days` days ending today (UTC).
///
/// Events without a timestamp, or outside the window, are not counted.
/// `days` is capped at [`MAX_CHART_DAYS`].
pub fn daily_counts<'a, I>(events: I, days: u32, now: DateTime<Utc>) -> ChartSeries
where
    I: IntoIterator<Item = &'a Event>,
{
    if days == 0 {
        return ChartSeries::default();
    }

    let days = days.min(MAX_CHART_DAYS);
    let today = now.date_naive();
    let start = today
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .unwrap_or(NaiveDate::MIN);
    let labels = (0..days)
        .map_while(|offset| start.checked_add_days(Days::new(u64::from(offset))))
        .map(|day| day.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>();
    let mut counts = vec![0u64; labels.len()];

    for ts in events.into_iter().filter_map(|e| e.created_at) {
        let day = ts.date_naive();
        if day < start || day > today {
            continue;
        }
        let offset = (day - start).num_days() as usize;
        if let Some(count) = counts.get_mut(offset) {
            *count += 1;
        }
    }

    ChartSeries { labels, counts }
}

/// Activity counts by weekday and hour (UTC).
///
/// Row 0 is Sunday, row 6 Saturday; columns are hours 0-23.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub cells: [[u64; 24]; 7],
}

impl Default for Heatmap {
    fn default() -> Self {
        Self {
            cells: [[0; 24]; 7],
        }
    }
}

impl Heatmap {
    /// Bucket events by creation weekday and hour. Events without a timestamp are skipped.
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut heatmap = Heatmap::default();
        for ts in events.into_iter().filter_map(|e| e.created_at) {
            let day = ts.weekday().num_days_from_sunday() as usize;
            let hour = ts.hour() as usize;
            heatmap.cells[day][hour] += 1;
        }
        heatmap
    }

    pub fn get(&self, day: usize, hour: usize) -> u64 {
        self.cells
            .get(day)
            .and_then(|row| row.get(hour))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    /// Largest single cell, for shading.
    pub fn max(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Counts per hour across all weekdays.
    pub fn hourly_totals(&self) -> [u64; 24] {
        let mut totals = [0u64; 24];
        for row in &self.cells {
            for (hour, count) in row.iter().enumerate() {
                totals[hour] += count;
            }
        }
        totals
    }

    /// Counts per weekday across all hours.
    pub fn daily_totals(&self) -> [u64; 7] {
        let mut totals = [0u64; 7];
        for (day, row) in self.cells.iter().enumerate() {
            totals[day] = row.iter().sum();
        }
        totals
    }

    /// Hour (0-23) with the most activity; earliest wins ties. `None` when empty.
    pub fn peak_hour(&self) -> Option<u8> {
        peak_index(&self.hourly_totals()).map(|h| h as u8)
    }

    /// Weekday (0=Sunday) with the most activity; earliest wins ties. `None` when empty.
    pub fn busiest_day(&self) -> Option<u8> {
        peak_index(&self.daily_totals()).map(|d| d as u8)
    }
}

fn peak_index(values: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v > 0 && best.map(|(_, b)| v > b).unwrap_or(true) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fields::parse_timestamp;
    use chrono::TimeZone;

    fn event(user: &str, created: &str, likes: u64) -> Event {
        let mut e = Event::new(user);
        e.created_raw = Some(created.to_string());
        e.created_at = parse_timestamp(created);
        e.likes = likes;
        e
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_case_and_at_folding_merges_users() {
        let events = vec![event("@Alice", "2024-01-01", 5), event("alice", "2024-01-02", 3)];
        let users = aggregate(&events, TimeFilter::All, HourFilter::All, now());

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].posts, 2);
        assert_eq!(users[0].likes, 8);
    }

    #[test]
    fn test_rolling_window_excludes_old_events() {
        let events = vec![event("@Alice", "2024-01-01", 5), event("alice", "2024-01-02", 3)];
        let users = aggregate(&events, TimeFilter::LastNDays(7), HourFilter::All, now());
        assert!(users.is_empty());
    }

    #[test]
    fn test_unparseable_timestamps_only_count_for_all() {
        let events = vec![
            event("a", "not a date", 1),
            event("a", "2024-01-30T12:00:00Z", 1),
        ];

        let all = aggregate(&events, TimeFilter::All, HourFilter::All, now());
        assert_eq!(all[0].posts, 2);

        let week = aggregate(&events, TimeFilter::LastNDays(7), HourFilter::All, now());
        assert_eq!(week[0].posts, 1);

        let noon = aggregate(&events, TimeFilter::All, HourFilter::Hour(12), now());
        assert_eq!(noon[0].posts, 1);
    }

    #[test]
    fn test_posts_sum_matches_filtered_count() {
        let events = vec![
            event("a", "2024-01-31T01:00:00Z", 0),
            event("b", "2024-01-20T02:00:00Z", 0),
            event("c", "2024-01-29T01:30:00Z", 0),
            event("a", "garbage", 0),
            event("b", "2024-01-30T23:00:00Z", 0),
        ];

        for filter in [TimeFilter::All, TimeFilter::LastNDays(3), TimeFilter::LastNDays(30)] {
            for hour in [HourFilter::All, HourFilter::Hour(1)] {
                let users = aggregate(&events, filter, hour, now());
                let posts: u64 = users.iter().map(|u| u.posts).sum();
                let expected = filter_events(&events, filter, hour, now()).len() as u64;
                assert_eq!(posts, expected, "filter={filter} hour={hour}");
            }
        }
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let events = vec![event("b", "2024-01-31", 2), event("a", "2024-01-30", 1), event("b", "x", 4)];
        let first = aggregate(&events, TimeFilter::All, HourFilter::All, now());
        let second = aggregate(&events, TimeFilter::All, HourFilter::All, now());

        assert_eq!(first, second);
        assert_eq!(first[0].username, "b");
        assert_eq!(first[1].username, "a");
    }

    #[test]
    fn test_build_snapshot_covers_undated_events() {
        let events = vec![
            event("bob", "2024-01-01", 1),
            event("@Alice", "junk", 2),
            event("alice", "2020-05-05", 3),
        ];
        let rows = build_snapshot(&events);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "alice");
        assert_eq!((rows[0].posts, rows[0].likes), (2, 5));
        assert_eq!(rows[1].username, "bob");
    }

    #[test]
    fn test_daily_counts_window() {
        let events = vec![
            event("a", "2024-01-31T10:00:00Z", 0),
            event("a", "2024-01-31T11:00:00Z", 0),
            event("a", "2024-02-01T00:00:00Z", 0),
            event("a", "2024-01-01T00:00:00Z", 0),
            event("a", "junk", 0),
        ];
        let series = daily_counts(&events, 7, now());

        assert_eq!(series.len(), 7);
        assert_eq!(series.labels[0], "2024-01-26");
        assert_eq!(series.labels[6], "2024-02-01");
        assert_eq!(series.counts[5], 2);
        assert_eq!(series.counts[6], 1);
        assert_eq!(series.total(), 3);
        assert_eq!(series.max(), 2);
    }

    #[test]
    fn test_chart_window() {
        assert_eq!(chart_window(TimeFilter::All), 60);
        assert_eq!(chart_window(TimeFilter::LastNDays(14)), 14);
        assert!(daily_counts(&Vec::<Event>::new(), 0, now()).is_empty());
        assert_eq!(chart_window(TimeFilter::LastNDays(u32::MAX)), MAX_CHART_DAYS);
    }

    #[test]
    fn test_daily_counts_huge_window_is_capped() {
        let events = vec![event("a", "2024-01-31T10:00:00Z", 0)];
        let series = daily_counts(&events, 100_000_000, now());

        assert_eq!(series.len(), MAX_CHART_DAYS as usize);
        assert_eq!(series.labels.last().map(String::as_str), Some("2024-02-01"));
        assert_eq!(series.total(), 1);
    }

    #[test]
    fn test_daily_counts_near_calendar_start() {
        let early = NaiveDate::MIN
            .checked_add_days(Days::new(10))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
            .and_utc();
        let series = daily_counts(&Vec::<Event>::new(), 365, early);

        assert_eq!(series.len(), 365);
        assert_eq!(series.total(), 0);
    }

    #[test]
    fn test_heatmap_buckets() {
        // 2024-01-28 is a Sunday, 2024-01-31 a Wednesday
        let events = vec![
            event("a", "2024-01-28T09:15:00Z", 0),
            event("a", "2024-01-31T09:45:00Z", 0),
            event("a", "2024-01-31T22:00:00Z", 0),
            event("a", "bad", 0),
        ];
        let heatmap = Heatmap::from_events(&events);

        assert_eq!(heatmap.get(0, 9), 1);
        assert_eq!(heatmap.get(3, 9), 1);
        assert_eq!(heatmap.get(3, 22), 1);
        assert_eq!(heatmap.total(), 3);
        assert_eq!(heatmap.peak_hour(), Some(9));
        assert_eq!(heatmap.busiest_day(), Some(3));
        assert_eq!(Heatmap::default().peak_hour(), None);
    }
}
