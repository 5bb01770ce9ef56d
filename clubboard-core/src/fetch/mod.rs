//! Loading the two inputs and keeping them fresh
//!
//! [`DataClient`] reads the leaderboard snapshot and the activity log from
//! http(s) URLs or local files. [`Poller`] runs it on a schedule in a
//! background task and hands results to the owner over a channel; the
//! owner decides when to apply them.

mod client;
mod poller;

pub use client::{DataClient, Source};
pub use poller::{Poller, Update};
