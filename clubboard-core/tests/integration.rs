//! Integration tests for the clubboard pipeline
//!
//! These tests use fixture files in `tests/fixtures/` to verify the
//! end-to-end flow: ingest, aggregation, both view models and export.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use clubboard_core::config::SourcesConfig;
use clubboard_core::ingest::{parse_events, parse_snapshot};
use clubboard_core::{
    Config, Dashboard, DataClient, ExportFormat, HourFilter, LeaderboardSource, Metric, Poller,
    PostMetric, SortOrder, TimeFilter, Update,
};
use tokio::sync::mpsc;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_json(name: &str) -> serde_json::Value {
    let content = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
}

/// Dashboard loaded with both fixtures at a frozen clock
fn loaded(config: &Config) -> Dashboard {
    let mut dashboard = Dashboard::new(config).with_clock(now);
    dashboard.apply(Update::Events(parse_events(&fixture_json("all_tweets.json")).events));
    dashboard.apply(Update::Snapshot(parse_snapshot(&fixture_json("leaderboard.json"))));
    dashboard
}

// ============================================
// Ingest
// ============================================

#[test]
fn test_fixture_events_are_normalized() {
    let parsed = parse_events(&fixture_json("all_tweets.json"));

    assert_eq!(parsed.events.len(), 5);
    assert_eq!(parsed.warnings.len(), 1);

    let first = &parsed.events[0];
    assert_eq!(first.author, "Alice");
    assert_eq!(first.username, "alice");
    assert_eq!(first.views, 1500);
    assert_eq!(first.retweets, 2);
    assert_eq!(first.comments, 1);
    assert_eq!(
        first.created_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 31, 9, 15, 0).unwrap())
    );
    assert_eq!(
        first.permalink.as_deref(),
        Some("https://twitter.com/Alice/status/101")
    );

    assert_eq!(parsed.events[1].permalink.as_deref(), Some("https://example.org/p/102"));
    assert_eq!(
        parsed.events[2].permalink.as_deref(),
        Some("https://twitter.com/Bob/status/103")
    );
    assert!(parsed.events[3].created_at.is_none());
    assert_eq!(parsed.events[3].text, "undated");
    assert_eq!(parsed.events[4].username, "dave");
}

#[test]
fn test_fixture_snapshot_rows() {
    let rows = parse_snapshot(&fixture_json("leaderboard.json"));

    assert_eq!(rows.len(), 3);
    let zed = rows.iter().find(|r| r.username == "zed").unwrap();
    assert_eq!(zed.posts, 3);
    assert_eq!(zed.likes, 7);
    assert_eq!(zed.views, 70);
    assert!(rows.iter().any(|r| r.username == "alice" && r.posts == 40));
}

// ============================================
// Leaderboard
// ============================================

#[test]
fn test_leaderboard_all_time() {
    let dashboard = loaded(&Config::default());
    let board = dashboard.leaderboard();

    let names: Vec<_> = board.rows().iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, ["alice", "bob", "carol", "dave"]);

    let totals = board.totals();
    assert_eq!(totals.users, 4);
    assert_eq!(totals.posts, 5);
    assert_eq!(totals.views, 1500 + 300 + 4000 + 10 + 20);

    let alice = dashboard.user_row("@ALICE").unwrap();
    assert_eq!(alice.posts, 2);
    assert_eq!(alice.likes, 15);
}

#[test]
fn test_leaderboard_week_window() {
    let mut dashboard = loaded(&Config::default());
    dashboard.set_time_filter(TimeFilter::LastNDays(7));

    let board = dashboard.leaderboard();
    let names: Vec<_> = board.rows().iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, ["alice", "dave"]);
    assert_eq!(board.totals().posts, 3);
    assert_eq!(board.current_page(), 1);
}

#[test]
fn test_sort_toggle_and_search() {
    let mut dashboard = loaded(&Config::default());

    dashboard.set_sort(Metric::Views);
    assert_eq!(dashboard.leaderboard().rows()[0].username, "bob");

    dashboard.set_sort(Metric::Views);
    assert_eq!(dashboard.leaderboard().sort().order, SortOrder::Asc);
    assert_eq!(dashboard.leaderboard().rows()[0].username, "carol");

    let before = dashboard.leaderboard().totals();
    dashboard.set_search("  @Al ");
    let frame = dashboard.leaderboard_frame();
    assert_eq!(frame.search, "al");
    assert_eq!(frame.filtered_count, 1);
    assert_eq!(frame.rows[0].username, "alice");
    assert_eq!(frame.total_pages, 1);
    assert_eq!(frame.totals, before);
}

#[test]
fn test_snapshot_source_for_all_time() {
    let mut config = Config::default();
    config.leaderboard.source = LeaderboardSource::Snapshot;
    let mut dashboard = loaded(&config);

    let names: Vec<_> = dashboard
        .leaderboard()
        .rows()
        .iter()
        .map(|r| r.username.as_str())
        .collect();
    assert_eq!(names, ["alice", "bob", "zed"]);
    assert_eq!(dashboard.leaderboard().totals().posts, 55);

    // Windowed filters always come from the event log
    dashboard.set_time_filter(TimeFilter::LastNDays(30));
    let names: Vec<_> = dashboard
        .leaderboard()
        .rows()
        .iter()
        .map(|r| r.username.as_str())
        .collect();
    assert_eq!(names, ["alice", "bob", "dave"]);
}

#[test]
fn test_user_accordion() {
    let mut dashboard = loaded(&Config::default());

    let events = dashboard.toggle_user("Alice").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].text, "Second post");

    assert!(dashboard.toggle_user("alice").is_none());
    assert!(dashboard.user_events("nobody").is_empty());
}

// ============================================
// Analytics
// ============================================

#[test]
fn test_analytics_views_agree() {
    let mut dashboard = loaded(&Config::default());
    dashboard.set_period(TimeFilter::LastNDays(30));

    let frame = dashboard.analytics_frame();
    assert_eq!(frame.summary.posts, 4);
    assert_eq!(frame.summary.users, 3);
    assert_eq!(frame.chart.len(), 30);
    assert_eq!(frame.chart.total(), frame.summary.posts);
    assert_eq!(frame.heatmap.total(), frame.summary.posts);
    assert_eq!(frame.top_posts[0].value, 50);
    assert_eq!(frame.top_posts[0].author, "Bob");

    dashboard.set_hour(HourFilter::Hour(9));
    dashboard.set_author_metric(Metric::Likes);
    dashboard.set_post_metric(PostMetric::Views);
    let frame = dashboard.analytics_frame();
    assert_eq!(frame.summary.posts, 2);
    assert_eq!(frame.top_authors[0].username, "bob");
    assert_eq!(frame.top_posts[0].value, 4000);
    assert_eq!(frame.top_posts[1].value, 1500);
    assert_eq!(frame.heatmap.peak_hour(), Some(9));
}

#[test]
fn test_analytics_all_time_includes_undated() {
    let dashboard = loaded(&Config::default());
    let frame = dashboard.analytics_frame();

    assert_eq!(frame.summary.posts, 5);
    assert_eq!(frame.chart.len(), 60);
    // The undated post counts in the totals but has no day or hour
    assert_eq!(frame.chart.total(), 4);
    assert_eq!(frame.heatmap.total(), 4);
}

// ============================================
// Export
// ============================================

#[test]
fn test_export_csv_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = loaded(&Config::default());
    dashboard.set_period(TimeFilter::LastNDays(7));

    let csv_path = dashboard.export(dir.path(), ExportFormat::Csv).unwrap();
    assert_eq!(
        csv_path.file_name().unwrap().to_str().unwrap(),
        "clubboard-analytics-7-20240201-000000.csv"
    );
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        csv,
        "Username,Posts,Likes,Views\n\"alice\",\"2\",\"15\",\"1800\"\n\"dave\",\"1\",\"0\",\"20\""
    );

    let json_path = dashboard.export(dir.path(), ExportFormat::Json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(value["period"], "7");
    assert_eq!(value["users"].as_array().unwrap().len(), 2);
    assert_eq!(value["events"].as_array().unwrap().len(), 3);
}

// ============================================
// Fetch and poll
// ============================================

#[tokio::test]
async fn test_poller_feeds_dashboard() {
    let sources = SourcesConfig {
        leaderboard: fixture_path("leaderboard.json").to_string_lossy().into_owned(),
        events: fixture_path("all_tweets.json").to_string_lossy().into_owned(),
        ..Default::default()
    };
    let client = Arc::new(DataClient::new(&sources).unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = Poller::start(client, Duration::from_secs(3600), tx);

    let mut dashboard = Dashboard::new(&Config::default()).with_clock(now);
    for _ in 0..2 {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        dashboard.apply(update);
    }
    poller.stop();

    assert_eq!(dashboard.events().len(), 5);
    assert_eq!(dashboard.snapshot().len(), 3);
    assert_eq!(dashboard.leaderboard().totals().users, 4);
}
