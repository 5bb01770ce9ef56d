//! clubboard - community leaderboard and activity analytics
//!
//! Fetches the leaderboard snapshot and the activity log, then prints the
//! sortable leaderboard table, the analytics panel, a single user's posts,
//! exports the analytics snapshot to CSV/JSON, or rebuilds the leaderboard
//! snapshot from the activity log.

mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clubboard_core::analytics::build_snapshot;
use clubboard_core::{
    Config, Dashboard, DataClient, ExportFormat, HourFilter, LeaderboardSource, Metric, Poller,
    PostMetric, SortOrder, SortSpec, TimeFilter, Update,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::render::WatchSink;

#[derive(Parser, Debug)]
#[command(name = "clubboard")]
#[command(about = "Community leaderboard and activity analytics")]
#[command(version)]
struct Cli {
    /// Leaderboard snapshot location (URL or path), overrides config
    #[arg(long, global = true)]
    leaderboard: Option<String>,

    /// Activity log location (URL or path), overrides config
    #[arg(long, global = true)]
    events: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/clubboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print frames as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sortable, searchable leaderboard table
    Table(TableArgs),
    /// Activity chart, top authors, top posts and heatmap
    Analytics(AnalyticsArgs),
    /// Every post by one user
    User {
        /// Handle, with or without the leading @
        name: String,
    },
    /// Write the analytics snapshot to a file
    Export(ExportArgs),
    /// Rebuild the leaderboard snapshot from the activity log
    BuildSnapshot {
        /// Output file
        #[arg(long, default_value = "leaderboard.json")]
        out: PathBuf,
    },
    /// Re-fetch on a schedule and reprint the table until Ctrl-C
    Watch {
        #[command(flatten)]
        table: TableArgs,

        /// Seconds between fetches (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Args, Debug, Clone)]
struct TableArgs {
    /// Time window: `all` or a number of days (e.g. 7, 30d)
    #[arg(long)]
    time: Option<TimeFilter>,

    /// Sort column: posts, likes, retweets, comments, views
    #[arg(long)]
    sort: Option<Metric>,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Username substring filter
    #[arg(long)]
    search: Option<String>,

    /// Page number (15 rows per page)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Table rows from the event log or the precomputed snapshot
    #[arg(long)]
    source: Option<SourceArg>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum SourceArg {
    Events,
    Snapshot,
}

impl From<SourceArg> for LeaderboardSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Events => LeaderboardSource::Events,
            SourceArg::Snapshot => LeaderboardSource::Snapshot,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct AnalyticsArgs {
    /// Period: `all` or a number of days
    #[arg(long)]
    period: Option<TimeFilter>,

    /// Only posts created in this UTC hour (0-23)
    #[arg(long)]
    hour: Option<HourFilter>,

    /// Rank top authors by posts, likes, retweets, comments or views
    #[arg(long)]
    authors: Option<Metric>,

    /// Rank top posts by likes or views
    #[arg(long)]
    posts: Option<PostMetric>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// csv or json (default from config)
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Target directory (default: downloads directory)
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    filters: AnalyticsArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    if let Some(leaderboard) = &cli.leaderboard {
        config.sources.leaderboard = leaderboard.clone();
    }
    if let Some(events) = &cli.events {
        config.sources.events = events.clone();
    }
    match &cli.command {
        Command::Table(args) | Command::Watch { table: args, .. } => {
            if let Some(source) = args.source {
                config.leaderboard.source = source.into();
            }
        }
        _ => {}
    }

    // Logs go to file; stdout carries the rendered output
    let _log_guard = clubboard_core::logging::init(&config.logging).ok();
    tracing::info!(command = ?cli.command, "clubboard starting");

    let client = DataClient::new(&config.sources).context("invalid [sources] configuration")?;

    match cli.command {
        Command::Table(args) => {
            let mut dashboard = load(&client, &config).await?;
            apply_table_args(&mut dashboard, &args);
            dashboard.page(args.page);
            let frame = dashboard.leaderboard_frame();
            if cli.json {
                render::print_json(&frame)?;
            } else {
                render::print_table(&frame, dashboard.now());
            }
        }
        Command::Analytics(args) => {
            let mut dashboard = load(&client, &config).await?;
            apply_analytics_args(&mut dashboard, &args);
            let frame = dashboard.analytics_frame();
            if cli.json {
                render::print_json(&frame)?;
            } else {
                render::print_analytics(&frame);
            }
        }
        Command::User { name } => {
            let mut dashboard = load(&client, &config).await?;
            let row = dashboard.user_row(&name).cloned();
            let events = dashboard.toggle_user(&name).unwrap_or_default();
            if events.is_empty() && row.is_none() {
                anyhow::bail!("no activity found for user '{}'", name);
            }
            if cli.json {
                render::print_json(&serde_json::json!({
                    "user": row,
                    "events": events,
                }))?;
            } else {
                render::print_user(&name, row.as_ref(), &events);
            }
        }
        Command::Export(args) => {
            let mut dashboard = load(&client, &config).await?;
            apply_analytics_args(&mut dashboard, &args.filters);
            let format = args.format.unwrap_or(config.export.format);
            let dir = args.out.unwrap_or_else(|| config.export.dir());
            let path = dashboard
                .export(&dir, format)
                .with_context(|| format!("failed to export to {}", dir.display()))?;
            println!("{}", path.display());
        }
        Command::BuildSnapshot { out } => {
            let dashboard = load(&client, &config).await?;
            let rows = build_snapshot(dashboard.events().items());
            clubboard_core::export::write_snapshot(&out, &rows)
                .with_context(|| format!("failed to write snapshot to {}", out.display()))?;
            println!("{}", out.display());
        }
        Command::Watch { table, interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.sources.poll_interval());
            watch(client, &config, table, interval, cli.json).await?;
        }
    }

    Ok(())
}

/// Fetch both inputs once into a fresh dashboard.
///
/// A missing activity log is fatal. A missing snapshot only matters when the
/// table is configured to read from it.
async fn load(client: &DataClient, config: &Config) -> Result<Dashboard> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Fetching leaderboard and activity log...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let (events, snapshot) = tokio::join!(client.fetch_events(), client.fetch_snapshot());
    pb.finish_and_clear();

    let parsed = events
        .with_context(|| format!("failed to load activity log from {}", client.events_source()))?;
    if !parsed.warnings.is_empty() {
        tracing::warn!(skipped = parsed.warnings.len(), "Some activity records were skipped");
    }

    let mut dashboard = Dashboard::new(config);
    dashboard.apply(Update::Events(parsed.events));

    match snapshot {
        Ok(rows) => dashboard.apply(Update::Snapshot(rows)),
        Err(e) if config.leaderboard.source == LeaderboardSource::Snapshot => {
            return Err(e).with_context(|| {
                format!(
                    "failed to load leaderboard snapshot from {}",
                    client.leaderboard_source()
                )
            });
        }
        Err(e) => tracing::warn!(error = %e, "Leaderboard snapshot unavailable"),
    }

    Ok(dashboard)
}

fn apply_table_args(dashboard: &mut Dashboard, args: &TableArgs) {
    if let Some(time) = args.time {
        dashboard.set_time_filter(time);
    }
    if args.sort.is_some() || args.asc {
        let key = args.sort.unwrap_or(dashboard.leaderboard().sort().key);
        let order = if args.asc { SortOrder::Asc } else { SortOrder::Desc };
        dashboard.set_sort_spec(SortSpec { key, order });
    }
    if let Some(query) = &args.search {
        dashboard.set_search(query);
    }
}

fn apply_analytics_args(dashboard: &mut Dashboard, args: &AnalyticsArgs) {
    if let Some(period) = args.period {
        dashboard.set_period(period);
    }
    if let Some(hour) = args.hour {
        dashboard.set_hour(hour);
    }
    if let Some(metric) = args.authors {
        dashboard.set_author_metric(metric);
    }
    if let Some(metric) = args.posts {
        dashboard.set_post_metric(metric);
    }
}

async fn watch(
    client: DataClient,
    config: &Config,
    args: TableArgs,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let mut dashboard = Dashboard::new(config);
    apply_table_args(&mut dashboard, &args);
    dashboard.add_sink(Box::new(WatchSink::new(json)));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = Poller::start(Arc::new(client), interval, tx);

    // Pages only exist once rows have arrived
    let mut page_pending = args.page > 1;

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(update) => {
                    dashboard.apply(update);
                    if page_pending && !dashboard.leaderboard().rows().is_empty() {
                        page_pending = false;
                        dashboard.page(args.page);
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}
