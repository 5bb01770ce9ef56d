//! Field alias tables and value coercion
//!
//! Aliases are listed in priority order. Lookup picks the first alias that
//! holds a non-zero number (for counters) or a non-empty string (for text),
//! which matches how the upstream exporters fill some fields with `0` or `""`
//! while putting the real value under another name.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Event author. Dotted entries look inside a nested object.
pub const EVENT_AUTHOR: &[&str] = &["user.screen_name", "user.name", "username", "screen_name", "user"];
pub const EVENT_CREATED: &[&str] = &["tweet_created_at", "created_at", "created"];
pub const EVENT_LIKES: &[&str] = &["favorite_count", "likes", "like_count"];
pub const EVENT_RETWEETS: &[&str] = &["retweet_count", "retweets"];
pub const EVENT_COMMENTS: &[&str] = &["reply_count", "comments"];
pub const EVENT_VIEWS: &[&str] = &["views_count", "views"];
pub const EVENT_TEXT: &[&str] = &["full_text", "text", "content"];
pub const EVENT_ID: &[&str] = &["id_str", "id"];
pub const EVENT_URL: &[&str] = &["url"];

pub const SNAPSHOT_USERNAME: &[&str] = &["username", "user", "name", "screen_name"];
pub const SNAPSHOT_POSTS: &[&str] = &["posts", "tweets"];
pub const SNAPSHOT_LIKES: &[&str] = &["likes", "favorite_count"];
pub const SNAPSHOT_RETWEETS: &[&str] = &["retweets", "retweet_count"];
pub const SNAPSHOT_COMMENTS: &[&str] = &["comments", "reply_count"];
pub const SNAPSHOT_VIEWS: &[&str] = &["views", "views_count"];

/// Resolve an alias, following one level of `parent.child` nesting.
fn lookup<'a>(obj: &'a Map<String, Value>, alias: &str) -> Option<&'a Value> {
    match alias.split_once('.') {
        Some((parent, child)) => obj.get(parent)?.as_object()?.get(child),
        None => obj.get(alias),
    }
}

/// Coerce a JSON value to a non-negative counter.
///
/// Numbers are truncated, numeric strings are parsed, anything else is 0.
pub fn coerce_count(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => match n.as_u64() {
            Some(exact) => return exact,
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => {
            if n >= u64::MAX as f64 {
                u64::MAX
            } else {
                n as u64
            }
        }
        _ => 0,
    }
}

/// Coerce a JSON value to text. Numbers are rendered, everything else is `None`.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-zero counter across the aliases, else 0.
pub fn first_count(obj: &Map<String, Value>, aliases: &[&str]) -> u64 {
    aliases
        .iter()
        .filter_map(|alias| lookup(obj, alias))
        .map(coerce_count)
        .find(|&n| n > 0)
        .unwrap_or(0)
}

/// First alias holding a non-empty text or numeric value.
pub fn first_value<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| lookup(obj, alias))
        .find(|value| coerce_text(value).is_some())
}

/// Coerce a JSON value to a timestamp. Numbers are epoch milliseconds.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

/// First non-empty text value across the aliases.
pub fn first_text(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| lookup(obj, alias))
        .find_map(coerce_text)
}

/// Parse a timestamp in any of the formats seen in exported activity logs.
///
/// Naive values (no offset) are taken as UTC. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Twitter API v1 style: "Wed Oct 10 20:19:24 +0000 2018"
    if let Ok(ts) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
