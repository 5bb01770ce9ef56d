//! In-memory holders for the fetched inputs
//!
//! Each slot is replaced wholesale whenever a fetch succeeds. Nothing is ever
//! merged incrementally, and a failed fetch leaves the previous contents alone.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{Event, UserAggregate};

/// The latest successfully fetched batch of one input.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    items: Arc<[T]>,
    generation: u64,
    fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            generation: 0,
            fetched_at: None,
        }
    }
}

impl<T> Slot<T> {
    /// Replace the whole batch.
    pub fn replace(&mut self, items: Vec<T>, fetched_at: DateTime<Utc>) {
        self.items = Arc::from(items);
        self.generation += 1;
        self.fetched_at = Some(fetched_at);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Cheap shared handle to the current batch.
    pub fn shared(&self) -> Arc<[T]> {
        Arc::clone(&self.items)
    }

    /// Number of replacements so far; 0 means never loaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Raw activity events.
pub type EventStore = Slot<Event>;

/// Precomputed leaderboard rows.
pub type SnapshotStore = Slot<UserAggregate>;
