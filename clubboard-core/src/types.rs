//! Core domain types for clubboard
//!
//! These types model the two inputs (raw activity events and the per-user
//! leaderboard snapshot) and the filter/sort vocabulary shared by every view.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalize a handle into the identity key used for every username comparison.
///
/// Trims whitespace, lower-cases, and strips a single leading `@`.
pub fn normalize_handle(handle: &str) -> String {
    let lowered = handle.trim().to_lowercase();
    match lowered.strip_prefix('@') {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

// ============================================
// Events
// ============================================

/// One raw activity record (a post) from the activity log.
///
/// Immutable once fetched. A whole batch is replaced on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Post id (`id_str` / `id`), if present
    pub id: Option<String>,
    /// Author handle exactly as found in the source
    pub author: String,
    /// Normalized identity key derived from `author`
    pub username: String,
    /// Creation timestamp as found in the source
    pub created_raw: Option<String>,
    /// Parsed creation timestamp; `None` when missing or unparseable
    pub created_at: Option<DateTime<Utc>>,
    pub likes: u64,
    pub retweets: u64,
    pub comments: u64,
    pub views: u64,
    /// Body text
    pub text: String,
    /// Link to the post
    pub permalink: Option<String>,
}

impl Event {
    /// Create an event with zeroed counters for the given author.
    pub fn new(author: impl Into<String>) -> Self {
        let author = author.into();
        let username = normalize_handle(&author);
        Self {
            id: None,
            author,
            username,
            created_raw: None,
            created_at: None,
            likes: 0,
            retweets: 0,
            comments: 0,
            views: 0,
            text: String::new(),
            permalink: None,
        }
    }

    /// Value of a post-level metric.
    pub fn metric(&self, metric: PostMetric) -> u64 {
        match metric {
            PostMetric::Likes => self.likes,
            PostMetric::Views => self.views,
        }
    }

    /// First `max_chars` characters of the body text.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

// ============================================
// Aggregates
// ============================================

/// Summed engagement metrics for one user over a filtered event subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAggregate {
    /// Normalized identity key
    pub username: String,
    pub posts: u64,
    pub likes: u64,
    pub retweets: u64,
    pub comments: u64,
    pub views: u64,
}

impl UserAggregate {
    /// Empty aggregate for a username (normalized on the way in).
    pub fn new(username: &str) -> Self {
        Self {
            username: normalize_handle(username),
            ..Default::default()
        }
    }

    /// Fold one event into this aggregate.
    pub fn add_event(&mut self, event: &Event) {
        self.posts = self.posts.saturating_add(1);
        self.likes = self.likes.saturating_add(event.likes);
        self.retweets = self.retweets.saturating_add(event.retweets);
        self.comments = self.comments.saturating_add(event.comments);
        self.views = self.views.saturating_add(event.views);
    }

    /// Fold another aggregate for the same user into this one.
    pub fn merge(&mut self, other: &UserAggregate) {
        self.posts = self.posts.saturating_add(other.posts);
        self.likes = self.likes.saturating_add(other.likes);
        self.retweets = self.retweets.saturating_add(other.retweets);
        self.comments = self.comments.saturating_add(other.comments);
        self.views = self.views.saturating_add(other.views);
    }

    /// Value of the given metric.
    pub fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Posts => self.posts,
            Metric::Likes => self.likes,
            Metric::Retweets => self.retweets,
            Metric::Comments => self.comments,
            Metric::Views => self.views,
        }
    }
}

// ============================================
// Metrics and sorting
// ============================================

/// Per-user metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Posts,
    Likes,
    Retweets,
    Comments,
    Views,
}

impl Metric {
    /// Every column, in table order.
    pub const ALL: [Metric; 5] = [
        Metric::Posts,
        Metric::Likes,
        Metric::Retweets,
        Metric::Comments,
        Metric::Views,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Posts => "posts",
            Metric::Likes => "likes",
            Metric::Retweets => "retweets",
            Metric::Comments => "comments",
            Metric::Views => "views",
        }
    }

    /// Column heading for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Posts => "Posts",
            Metric::Likes => "Likes",
            Metric::Retweets => "Retweets",
            Metric::Comments => "Comments",
            Metric::Views => "Views",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "posts" | "tweets" => Ok(Metric::Posts),
            "likes" => Ok(Metric::Likes),
            "retweets" | "reposts" => Ok(Metric::Retweets),
            "comments" | "replies" => Ok(Metric::Comments),
            "views" => Ok(Metric::Views),
            other => Err(Error::InvalidFilter(format!("unknown metric: {other}"))),
        }
    }
}

/// Metric used to rank individual posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMetric {
    #[default]
    Likes,
    Views,
}

impl PostMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostMetric::Likes => "likes",
            PostMetric::Views => "views",
        }
    }
}

impl fmt::Display for PostMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "likes" => Ok(PostMetric::Likes),
            "views" => Ok(PostMetric::Views),
            other => Err(Error::InvalidFilter(format!(
                "posts can be ranked by likes or views, not {other}"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Header arrow glyph.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: Metric,
    pub order: SortOrder,
}

// ============================================
// Filters
// ============================================

/// Rolling time window, anchored at "now" whenever it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeFilter {
    #[default]
    All,
    /// Within `n` days of now (`n >= 1`)
    LastNDays(u32),
}

impl TimeFilter {
    /// Window length in days, or `None` for all time.
    pub fn days(&self) -> Option<u32> {
        match self {
            TimeFilter::All => None,
            TimeFilter::LastNDays(n) => Some(*n),
        }
    }

    /// Whether an event created at `created_at` falls inside the window.
    ///
    /// `All` accepts everything, including events without a usable timestamp.
    pub fn matches(&self, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            TimeFilter::All => true,
            TimeFilter::LastNDays(n) => created_at
                .map(|ts| now.signed_duration_since(ts) <= Duration::days(i64::from(*n)))
                .unwrap_or(false),
        }
    }

    /// Human label (e.g. "All time", "Last 7 days").
    pub fn display_name(&self) -> String {
        match self {
            TimeFilter::All => "All time".to_string(),
            TimeFilter::LastNDays(1) => "Last day".to_string(),
            TimeFilter::LastNDays(n) => format!("Last {} days", n),
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFilter::All => f.write_str("all"),
            TimeFilter::LastNDays(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for TimeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            return Ok(TimeFilter::All);
        }
        let digits = value.strip_suffix('d').unwrap_or(&value);
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(TimeFilter::LastNDays(n)),
            _ => Err(Error::InvalidFilter(format!(
                "time filter must be 'all' or a positive number of days, got {s:?}"
            ))),
        }
    }
}

impl TryFrom<String> for TimeFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeFilter> for String {
    fn from(filter: TimeFilter) -> Self {
        filter.to_string()
    }
}

/// Hour-of-day restriction, evaluated against the UTC creation hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HourFilter {
    #[default]
    All,
    /// 0..=23
    Hour(u8),
}

impl HourFilter {
    /// Build an hour filter, rejecting hours outside 0..=23.
    pub fn hour(hour: u8) -> Result<Self> {
        if hour < 24 {
            Ok(HourFilter::Hour(hour))
        } else {
            Err(Error::InvalidFilter(format!(
                "hour must be between 0 and 23, got {hour}"
            )))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, HourFilter::All)
    }

    /// Whether an event created at `created_at` falls in the selected hour.
    pub fn matches(&self, created_at: Option<DateTime<Utc>>) -> bool {
        match self {
            HourFilter::All => true,
            HourFilter::Hour(h) => created_at
                .map(|ts| ts.hour() == u32::from(*h))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for HourFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HourFilter::All => f.write_str("all"),
            HourFilter::Hour(h) => write!(f, "{}", h),
        }
    }
}

impl FromStr for HourFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            return Ok(HourFilter::All);
        }
        let hour = value
            .parse::<u8>()
            .map_err(|_| Error::InvalidFilter(format!("invalid hour: {s:?}")))?;
        HourFilter::hour(hour)
    }
}

impl TryFrom<String> for HourFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HourFilter> for String {
    fn from(filter: HourFilter) -> Self {
        filter.to_string()
    }
}
