//! Terminal rendering of dashboard frames

use anyhow::Result;
use chrono::{DateTime, Utc};
use clubboard_core::analytics::{AnalyticsFrame, ChartSeries, Heatmap, LeaderboardFrame};
use clubboard_core::format::{
    day_name, format_count, format_relative_time_opt, hour_label, truncate,
};
use clubboard_core::{Event, HourFilter, Metric, RenderSink, UserAggregate};
use serde::Serialize;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table(frame: &LeaderboardFrame, now: DateTime<Utc>) {
    println!();
    println!(
        "LEADERBOARD  {}  (updated {})",
        frame.time_filter.display_name(),
        format_relative_time_opt(frame.updated_at, now)
    );
    println!(
        "   Users: {:<10} Posts: {:<12} Views: {}",
        format_count(frame.totals.users as u64),
        format_count(frame.totals.posts),
        format_count(frame.totals.views)
    );
    if !frame.search.is_empty() {
        println!(
            "   Search: \"{}\" ({} match{})",
            frame.search,
            frame.filtered_count,
            if frame.filtered_count == 1 { "" } else { "es" }
        );
    }
    println!();

    let mut header = format!("{:>4}  {:<24}", "#", "User");
    for metric in Metric::ALL {
        let marker = if frame.sort.key == metric {
            frame.sort.order.arrow()
        } else {
            " "
        };
        header.push_str(&format!(" {:>10}{}", metric.display_name(), marker));
    }
    println!("{}", header);
    println!("{}", "─".repeat(header.chars().count()));

    if frame.rows.is_empty() {
        println!("   No users match.");
    }
    for (i, row) in frame.rows.iter().enumerate() {
        let mut line = format!("{:>4}  {:<24}", frame.first_rank + i, truncate(&row.username, 24));
        for metric in Metric::ALL {
            line.push_str(&format!(" {:>10} ", format_count(row.metric(metric))));
        }
        println!("{}", line);
    }

    println!();
    println!("   Page {} of {}", frame.current_page, frame.total_pages);
    println!();
}

pub fn print_analytics(frame: &AnalyticsFrame) {
    println!();
    let hour = match frame.hour {
        HourFilter::Hour(h) => format!(" at {} UTC", hour_label(h)),
        HourFilter::All => String::new(),
    };
    println!("ANALYTICS  {}{}", frame.period.display_name(), hour);
    println!(
        "   Users: {:<10} Posts: {:<10} Likes: {:<12} Views: {}",
        format_count(frame.summary.users as u64),
        format_count(frame.summary.posts),
        format_count(frame.summary.likes),
        format_count(frame.summary.views)
    );
    println!();

    print_chart(&frame.chart);

    println!("TOP AUTHORS by {}", frame.author_metric);
    if frame.top_authors.is_empty() {
        println!("   (none)");
    }
    for (i, user) in frame.top_authors.iter().enumerate() {
        println!(
            "   {:>2}. {:<24} {:>10}",
            i + 1,
            truncate(&user.username, 24),
            format_count(user.metric(frame.author_metric))
        );
    }
    println!();

    println!("TOP POSTS by {}", frame.post_metric);
    if frame.top_posts.is_empty() {
        println!("   (none)");
    }
    for (i, post) in frame.top_posts.iter().enumerate() {
        println!(
            "   {:>2}. {:>10}  @{}  {}",
            i + 1,
            format_count(post.value),
            post.author.trim_start_matches('@'),
            truncate(&post.excerpt, 60)
        );
        if let Some(link) = &post.permalink {
            println!("       {}", link);
        }
    }
    println!();

    print_heatmap(&frame.heatmap);
}

fn print_chart(chart: &ChartSeries) {
    println!("POSTS PER DAY ({} days)", chart.len());
    if chart.total() == 0 {
        println!("   (no dated posts)");
        println!();
        return;
    }
    let max = chart.max();
    let line: String = chart
        .counts
        .iter()
        .map(|&c| {
            if c == 0 {
                ' '
            } else {
                let idx = ((c * (SPARK.len() as u64 - 1)) / max) as usize;
                SPARK[idx.min(SPARK.len() - 1)]
            }
        })
        .collect();
    println!("   {}", line);
    if let (Some(first), Some(last)) = (chart.labels.first(), chart.labels.last()) {
        println!("   {} .. {}  (peak {}/day)", first, last, max);
    }
    println!();
}

fn print_heatmap(heatmap: &Heatmap) {
    println!("ACTIVITY BY DAY AND HOUR (UTC)");
    let max = heatmap.max();
    println!("        {}", (0..24).map(|h| format!("{:<2}", h % 10)).collect::<String>());
    for day in 0..7 {
        let cells: String = (0..24)
            .map(|hour| {
                let count = heatmap.get(day, hour);
                let shade = if max == 0 || count == 0 {
                    SHADES[0]
                } else {
                    let steps = SHADES.len() as u64 - 1;
                    let idx = (count * steps).div_ceil(max);
                    SHADES[(idx as usize).min(SHADES.len() - 1)]
                };
                format!("{}{}", shade, shade)
            })
            .collect();
        println!("   {}  {}", day_name(day), cells);
    }
    if let Some(hour) = heatmap.peak_hour() {
        println!("   Peak hour:    {}", hour_label(hour));
    }
    if let Some(day) = heatmap.busiest_day() {
        println!("   Busiest day:  {}", day_name(day as usize));
    }
    println!();
}

pub fn print_user(name: &str, row: Option<&UserAggregate>, events: &[&Event]) {
    println!();
    println!("@{}", name.trim().trim_start_matches('@'));
    if let Some(row) = row {
        println!(
            "   Posts: {}  Likes: {}  Retweets: {}  Comments: {}  Views: {}",
            format_count(row.posts),
            format_count(row.likes),
            format_count(row.retweets),
            format_count(row.comments),
            format_count(row.views)
        );
    }
    println!();
    for event in events {
        let when = event
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .or_else(|| event.created_raw.clone())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<16}  ♥ {:<8} 👁 {:<10} {}",
            when,
            format_count(event.likes),
            format_count(event.views),
            truncate(&event.text, 60)
        );
        if let Some(link) = &event.permalink {
            println!("   {:<16}  {}", "", link);
        }
    }
    println!();
}

/// Reprints the table whenever the leaderboard changes.
pub struct WatchSink {
    json: bool,
    last: Option<LeaderboardFrame>,
}

impl WatchSink {
    pub fn new(json: bool) -> Self {
        Self { json, last: None }
    }

    /// Records `frame` and reports whether it differs from the last one shown.
    fn is_new(&mut self, frame: &LeaderboardFrame) -> bool {
        if self.last.as_ref() == Some(frame) {
            return false;
        }
        self.last = Some(frame.clone());
        true
    }
}

impl RenderSink for WatchSink {
    fn leaderboard(&mut self, frame: &LeaderboardFrame) {
        // Updates that leave the table untouched (e.g. an unused snapshot) are skipped
        if !self.is_new(frame) {
            return;
        }
        if self.json {
            if let Err(e) = print_json(frame) {
                tracing::warn!(error = %e, "Failed to print frame");
            }
        } else {
            print_table(frame, Utc::now());
        }
    }
}
