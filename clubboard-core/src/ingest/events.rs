//! Activity log (`all_tweets.json`) parsing

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::fields::{self, first_count, first_text};
use crate::types::Event;

/// Result of parsing an activity log payload.
#[derive(Debug, Default)]
pub struct ParsedEvents {
    /// Normalized events, in source order
    pub events: Vec<Event>,
    /// Records that were skipped, with the reason (non-fatal)
    pub warnings: Vec<String>,
}

/// Parse an activity log payload.
///
/// Accepted shapes, checked in order:
/// 1. a bare array of event objects
/// 2. an object with a `tweets` array
/// 3. an object with a `data` array
/// 4. any other object, taken as a single event
///
/// Anything else yields an empty batch. A record whose id was already seen
/// is a re-collected copy and is skipped; records without an id are kept.
pub fn parse_events(payload: &Value) -> ParsedEvents {
    let records: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get("tweets") {
                items.iter().collect()
            } else if let Some(Value::Array(items)) = obj.get("data") {
                items.iter().collect()
            } else {
                vec![payload]
            }
        }
        _ => Vec::new(),
    };

    let mut result = ParsedEvents {
        events: Vec::with_capacity(records.len()),
        warnings: Vec::new(),
    };
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let Some(obj) = record.as_object() else {
            result
                .warnings
                .push(format!("record {}: not an object, skipped", index));
            continue;
        };

        match parse_event(obj) {
            Some(event) => {
                if let Some(id) = &event.id {
                    if !seen_ids.insert(id.clone()) {
                        result
                            .warnings
                            .push(format!("record {}: duplicate id {}, skipped", index, id));
                        continue;
                    }
                }
                result.events.push(event);
            }
            None => result
                .warnings
                .push(format!("record {}: no author handle, skipped", index)),
        }
    }

    if !result.warnings.is_empty() {
        tracing::debug!(
            skipped = result.warnings.len(),
            parsed = result.events.len(),
            "Skipped unusable activity records"
        );
    }

    result
}

/// Parse a single event object. Returns `None` when no author can be found.
pub fn parse_event(obj: &Map<String, Value>) -> Option<Event> {
    let author = first_text(obj, fields::EVENT_AUTHOR)?;
    let mut event = Event::new(author);
    if event.username.is_empty() {
        return None;
    }

    event.id = first_text(obj, fields::EVENT_ID);
    let created = fields::first_value(obj, fields::EVENT_CREATED);
    event.created_raw = created.and_then(fields::coerce_text);
    event.created_at = created.and_then(fields::coerce_timestamp);
    event.likes = first_count(obj, fields::EVENT_LIKES);
    event.retweets = first_count(obj, fields::EVENT_RETWEETS);
    event.comments = first_count(obj, fields::EVENT_COMMENTS);
    event.views = first_count(obj, fields::EVENT_VIEWS);
    event.text = first_text(obj, fields::EVENT_TEXT).unwrap_or_default();
    let fallback = event.id.as_deref().map(|id| status_url(&event.author, id));
    event.permalink = first_text(obj, fields::EVENT_URL).or(fallback);

    Some(event)
}

/// Status link built from the author handle and post id.
fn status_url(author: &str, id: &str) -> String {
    let handle = author.trim().trim_start_matches('@');
    format!(
        "https://twitter.com/{}/status/{}",
        urlencoding::encode(handle),
        urlencoding::encode(id)
    )
}
