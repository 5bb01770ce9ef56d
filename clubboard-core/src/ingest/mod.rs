//! Ingestion layer for the two JSON inputs
//!
//! Both inputs arrive in several loosely-defined shapes. This module turns
//! them into normalized [`Event`](crate::types::Event) and
//! [`UserAggregate`](crate::types::UserAggregate) values before anything
//! else looks at them, so shape detection and field-name aliasing can be
//! tested in isolation from aggregation.
//!
//! ## Inputs
//!
//! ```text
//! all_tweets.json ──► parse_events()   ──► Vec<Event>          ──► EventStore
//! leaderboard.json ─► parse_snapshot() ──► Vec<UserAggregate>  ──► SnapshotStore
//! ```
//!
//! ## Design Principles
//!
//! 1. **Tolerant**: unknown shapes produce an empty batch, never an error
//! 2. **Coercing**: malformed numbers become 0, bad timestamps become `None`
//! 3. **Documented aliases**: each field has a fixed alias priority in [`fields`]

mod events;
pub mod fields;
mod snapshot;

pub use events::{parse_event, parse_events, ParsedEvents};
pub use snapshot::parse_snapshot;
