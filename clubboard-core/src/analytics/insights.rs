//! Analytics view model: period/hour filters, rankings, chart series and heatmap.
//!
//! Keeps its own filter state, independent of the leaderboard's time filter.
//! Every view it exposes is derived from the same filtered event subset, so
//! the chart, heatmap, rankings and export always agree with each other.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregate::{aggregate_events, chart_window, daily_counts, filter_events, ChartSeries, Heatmap};
use crate::types::{Event, HourFilter, Metric, PostMetric, TimeFilter, UserAggregate};

/// Length of the top-N rankings.
pub const TOP_N: usize = 10;

/// Characters of body text shown for a ranked post.
pub const EXCERPT_CHARS: usize = 200;

/// A ranked post, projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPost {
    pub excerpt: String,
    pub author: String,
    pub permalink: Option<String>,
    pub value: u64,
}

/// Headline numbers for the analytics panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub users: usize,
    pub posts: u64,
    pub likes: u64,
    pub views: u64,
}

/// Last computed aggregate, read by export without recomputing.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub period: TimeFilter,
    pub hour: HourFilter,
    pub generated_at: DateTime<Utc>,
    /// Per-user totals, in first-seen order
    pub users: Vec<UserAggregate>,
    /// The events that passed the filters
    pub events: Vec<Event>,
}

impl Default for AnalyticsSnapshot {
    fn default() -> Self {
        Self {
            period: TimeFilter::All,
            hour: HourFilter::All,
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
            users: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// What a renderer needs to paint the analytics panel.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsFrame {
    pub period: TimeFilter,
    pub hour: HourFilter,
    pub author_metric: Metric,
    pub post_metric: PostMetric,
    pub summary: AnalyticsSummary,
    pub chart: ChartSeries,
    pub heatmap: Heatmap,
    pub top_authors: Vec<UserAggregate>,
    pub top_posts: Vec<TopPost>,
}

/// Rank users descending by `metric` and keep the first `n`. Ties keep input order.
pub fn rank_authors(users: &[UserAggregate], metric: Metric, n: usize) -> Vec<UserAggregate> {
    let mut ranked: Vec<&UserAggregate> = users.iter().collect();
    ranked.sort_by(|a, b| b.metric(metric).cmp(&a.metric(metric)));
    ranked.into_iter().take(n).cloned().collect()
}

/// Rank events descending by `metric` and keep the first `n`. Ties keep input order.
pub fn rank_posts<'a, I>(events: I, metric: PostMetric, n: usize) -> Vec<TopPost>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut ranked: Vec<&Event> = events.into_iter().collect();
    ranked.sort_by(|a, b| b.metric(metric).cmp(&a.metric(metric)));
    ranked
        .into_iter()
        .take(n)
        .map(|event| TopPost {
            excerpt: event.excerpt(EXCERPT_CHARS),
            author: event.author.clone(),
            permalink: event.permalink.clone(),
            value: event.metric(metric),
        })
        .collect()
}

/// Analytics panel state.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsView {
    period: TimeFilter,
    hour: HourFilter,
    author_metric: Metric,
    post_metric: PostMetric,
    snapshot: AnalyticsSnapshot,
    chart: ChartSeries,
    heatmap: Heatmap,
    summary: AnalyticsSummary,
}

impl AnalyticsView {
    pub fn new(period: TimeFilter) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Recompute everything from `events` under the current period and hour.
    pub fn refresh(&mut self, events: &[Event], now: DateTime<Utc>) {
        let filtered = filter_events(events, self.period, self.hour, now);
        let users = aggregate_events(filtered.iter().copied());

        self.chart = daily_counts(filtered.iter().copied(), chart_window(self.period), now);
        self.heatmap = Heatmap::from_events(filtered.iter().copied());
        self.summary = AnalyticsSummary {
            users: users.len(),
            posts: filtered.len() as u64,
            likes: users.iter().map(|u| u.likes).sum(),
            views: users.iter().map(|u| u.views).sum(),
        };
        self.snapshot = AnalyticsSnapshot {
            period: self.period,
            hour: self.hour,
            generated_at: now,
            users,
            events: filtered.into_iter().cloned().collect(),
        };

        tracing::debug!(
            period = %self.period,
            hour = %self.hour,
            posts = self.summary.posts,
            users = self.summary.users,
            "Analytics recomputed"
        );
    }

    pub fn set_period(&mut self, period: TimeFilter, events: &[Event], now: DateTime<Utc>) {
        self.period = period;
        self.refresh(events, now);
    }

    pub fn set_hour(&mut self, hour: HourFilter, events: &[Event], now: DateTime<Utc>) {
        self.hour = hour;
        self.refresh(events, now);
    }

    pub fn set_author_metric(&mut self, metric: Metric) {
        self.author_metric = metric;
    }

    pub fn set_post_metric(&mut self, metric: PostMetric) {
        self.post_metric = metric;
    }

    /// Top users in the last computed aggregate.
    pub fn top_authors(&self, metric: Metric) -> Vec<UserAggregate> {
        rank_authors(&self.snapshot.users, metric, TOP_N)
    }

    /// Top individual posts among the last filtered events.
    pub fn top_posts(&self, metric: PostMetric) -> Vec<TopPost> {
        rank_posts(&self.snapshot.events, metric, TOP_N)
    }

    pub fn snapshot(&self) -> &AnalyticsSnapshot {
        &self.snapshot
    }

    pub fn chart(&self) -> &ChartSeries {
        &self.chart
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn summary(&self) -> AnalyticsSummary {
        self.summary
    }

    pub fn period(&self) -> TimeFilter {
        self.period
    }

    pub fn hour(&self) -> HourFilter {
        self.hour
    }

    pub fn author_metric(&self) -> Metric {
        self.author_metric
    }

    pub fn post_metric(&self) -> PostMetric {
        self.post_metric
    }

    pub fn frame(&self) -> AnalyticsFrame {
        AnalyticsFrame {
            period: self.period,
            hour: self.hour,
            author_metric: self.author_metric,
            post_metric: self.post_metric,
            summary: self.summary,
            chart: self.chart.clone(),
            heatmap: self.heatmap.clone(),
            top_authors: self.top_authors(self.author_metric),
            top_posts: self.top_posts(self.post_metric),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::MAX_CHART_DAYS;
    use chrono::{Duration, TimeZone, Timelike};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn post(user: &str, likes: u64, views: u64, days_ago: i64, hour: u32) -> Event {
        let mut e = Event::new(user);
        e.likes = likes;
        e.views = views;
        e.text = format!("{user} posted {likes}");
        let day = now() - Duration::days(days_ago);
        e.created_at = day.with_hour(hour);
        e
    }

    #[test]
    fn test_top_posts_ordered_by_likes() {
        let events = vec![post("a", 5, 0, 1, 9), post("b", 1, 0, 1, 9), post("c", 9, 0, 1, 9)];
        let mut view = AnalyticsView::default();
        view.refresh(&events, now());

        let values: Vec<u64> = view.top_posts(PostMetric::Likes).iter().map(|p| p.value).collect();
        assert_eq!(values, [9, 5, 1]);
    }

    #[test]
    fn test_top_lists_capped_at_ten() {
        let events: Vec<Event> = (0..25)
            .map(|i| post(&format!("u{i}"), i as u64, 100 - i as u64, 1, 10))
            .collect();
        let mut view = AnalyticsView::default();
        view.refresh(&events, now());

        let authors = view.top_authors(Metric::Views);
        assert_eq!(authors.len(), 10);
        assert_eq!(authors[0].username, "u0");

        let posts = view.top_posts(PostMetric::Views);
        assert_eq!(posts.len(), 10);
        assert_eq!(posts[0].value, 100);
    }

    #[test]
    fn test_rank_authors_ties_keep_order() {
        let users = vec![UserAggregate::new("x"), UserAggregate::new("y"), UserAggregate::new("z")];
        let ranked = rank_authors(&users, Metric::Likes, 10);
        let names: Vec<_> = ranked.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn test_excerpt_is_truncated_by_chars() {
        let mut e = post("a", 1, 1, 0, 0);
        e.text = "é".repeat(300);
        let ranked = rank_posts([&e], PostMetric::Likes, 1);
        assert_eq!(ranked[0].excerpt.chars().count(), EXCERPT_CHARS);
    }

    #[test]
    fn test_period_and_hour_drive_every_output() {
        let events = vec![
            post("a", 1, 10, 1, 9),
            post("a", 2, 20, 3, 14),
            post("b", 3, 30, 20, 9),
            post("c", 4, 40, 100, 9),
        ];
        let mut view = AnalyticsView::new(TimeFilter::LastNDays(7));
        view.refresh(&events, now());

        assert_eq!(view.summary().posts, 2);
        assert_eq!(view.summary().users, 1);
        assert_eq!(view.chart().len(), 7);
        assert_eq!(view.chart().total(), 2);
        assert_eq!(view.heatmap().total(), 2);
        assert_eq!(view.snapshot().events.len(), 2);

        view.set_hour(HourFilter::Hour(9), &events, now());
        assert_eq!(view.summary().posts, 1);
        assert_eq!(view.heatmap().peak_hour(), Some(9));

        view.set_period(TimeFilter::All, &events, now());
        assert_eq!(view.summary().posts, 3);
        assert_eq!(view.summary().likes, 1 + 3 + 4);
        // 100-day-old post is outside the 60-day chart
        assert_eq!(view.chart().len(), 60);
        assert_eq!(view.chart().total(), 2);
        assert_eq!(view.snapshot().period, TimeFilter::All);
        assert_eq!(view.snapshot().hour, HourFilter::Hour(9));
    }

    #[test]
    fn test_frame_uses_selected_metrics() {
        let events = vec![post("a", 1, 500, 1, 9), post("b", 7, 5, 1, 9)];
        let mut view = AnalyticsView::default();
        view.refresh(&events, now());

        view.set_author_metric(Metric::Likes);
        view.set_post_metric(PostMetric::Views);
        let frame = view.frame();

        assert_eq!(frame.top_authors[0].username, "b");
        assert_eq!(frame.top_posts[0].value, 500);
        assert_eq!(frame.top_posts[0].author, "a");
    }

    #[test]
    fn test_huge_period_caps_chart() {
        let events = vec![post("a", 1, 1, 3, 9)];
        let period: TimeFilter = "100000000".parse().unwrap();
        let mut view = AnalyticsView::new(period);
        view.refresh(&events, now());

        assert_eq!(view.chart().len(), MAX_CHART_DAYS as usize);
        assert_eq!(view.chart().total(), 1);
        assert_eq!(view.summary().posts, 1);
    }
}
