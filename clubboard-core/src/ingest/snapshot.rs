//! Leaderboard snapshot (`leaderboard.json`) parsing

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::fields::{self, first_count, first_text};
use crate::types::{normalize_handle, UserAggregate};

/// Parse a leaderboard snapshot into per-user rows.
///
/// Accepted shapes:
/// - an array of stat objects carrying their own username
/// - an array of `[name, stats]` pairs
/// - an object keyed by username
///
/// Rows are normalized to the identity key; rows sharing a key are merged
/// and the result keeps first-seen order. Rows without a name are dropped.
pub fn parse_snapshot(payload: &Value) -> Vec<UserAggregate> {
    let empty = Map::new();
    let rows: Vec<UserAggregate> = match payload {
        Value::Array(items) if items.first().map(Value::is_array).unwrap_or(false) => items
            .iter()
            .filter_map(|item| {
                let pair = item.as_array()?;
                let stats = pair.get(1).and_then(Value::as_object).unwrap_or(&empty);
                let name = pair.first().and_then(fields::coerce_text);
                Some(row_from_stats(name.as_deref(), stats))
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|stats| row_from_stats(None, stats))
            .collect(),
        Value::Object(obj) => obj
            .iter()
            .map(|(name, stats)| row_from_stats(Some(name), stats.as_object().unwrap_or(&empty)))
            .collect(),
        _ => Vec::new(),
    };

    merge_rows(rows)
}

/// Build a row from a stats object; `name` overrides any name inside it.
fn row_from_stats(name: Option<&str>, stats: &Map<String, Value>) -> UserAggregate {
    let username = name
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .or_else(|| first_text(stats, fields::SNAPSHOT_USERNAME))
        .unwrap_or_default();

    UserAggregate {
        username: normalize_handle(&username),
        posts: first_count(stats, fields::SNAPSHOT_POSTS),
        likes: first_count(stats, fields::SNAPSHOT_LIKES),
        retweets: first_count(stats, fields::SNAPSHOT_RETWEETS),
        comments: first_count(stats, fields::SNAPSHOT_COMMENTS),
        views: first_count(stats, fields::SNAPSHOT_VIEWS),
    }
}

fn merge_rows(rows: Vec<UserAggregate>) -> Vec<UserAggregate> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut merged: Vec<UserAggregate> = Vec::with_capacity(rows.len());

    for row in rows {
        if row.username.is_empty() {
            continue;
        }
        match index.get(&row.username) {
            Some(&i) => merged[i].merge(&row),
            None => {
                index.insert(row.username.clone(), merged.len());
                merged.push(row);
            }
        }
    }

    merged
}
