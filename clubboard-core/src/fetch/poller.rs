//! Scheduled re-fetch of both inputs
//!
//! One background task issues both fetches immediately and then once per
//! interval. Each successful fetch becomes an [`Update`] on the channel;
//! failures are logged and leave the owner's data untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::client::DataClient;
use crate::types::{Event, UserAggregate};

/// A freshly fetched input, replacing the previous one wholesale.
#[derive(Debug, Clone)]
pub enum Update {
    Events(Vec<Event>),
    Snapshot(Vec<UserAggregate>),
}

enum PollCommand {
    RefreshNow,
}

/// Handle to the polling task. Dropping it stops polling.
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
    commands: mpsc::UnboundedSender<PollCommand>,
    interval: Duration,
}

impl Poller {
    /// Spawn the polling task. Must be called inside a tokio runtime.
    pub fn start(
        client: Arc<DataClient>,
        interval: Duration,
        updates: mpsc::UnboundedSender<Update>,
    ) -> Self {
        let (commands, mut command_rx) = mpsc::unbounded_channel();
        // interval() panics on a zero period
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    command = command_rx.recv() => match command {
                        Some(PollCommand::RefreshNow) => {
                            debug!("Manual refresh requested");
                            ticker.reset();
                        }
                        None => return,
                    },
                }

                poll_once(&client, &updates).await;

                if updates.is_closed() {
                    debug!("Update receiver dropped, stopping poller");
                    return;
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Poller started");

        Self {
            handle,
            commands,
            interval: period,
        }
    }

    /// Fetch now and restart the interval from this moment.
    pub fn refresh_now(&self) {
        if self.commands.send(PollCommand::RefreshNow).is_err() {
            warn!("Refresh requested but the poller is not running");
        }
    }

    /// Stop polling. In-flight requests are abandoned.
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            info!("Poller stopped");
        }
    }

    /// Stop this poller and start a new one in its place.
    pub fn replace(
        &mut self,
        client: Arc<DataClient>,
        interval: Duration,
        updates: mpsc::UnboundedSender<Update>,
    ) {
        self.stop();
        *self = Poller::start(client, interval, updates);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Issue both fetches concurrently and forward whatever succeeds.
async fn poll_once(client: &DataClient, updates: &mpsc::UnboundedSender<Update>) {
    let (events, snapshot) = tokio::join!(client.fetch_events(), client.fetch_snapshot());

    match events {
        Ok(parsed) => {
            let _ = updates.send(Update::Events(parsed.events));
        }
        Err(e) => warn!(source = %client.events_source(), error = %e, "Activity log fetch failed"),
    }

    match snapshot {
        Ok(rows) => {
            let _ = updates.send(Update::Snapshot(rows));
        }
        Err(e) => warn!(
            source = %client.leaderboard_source(),
            error = %e,
            "Leaderboard snapshot fetch failed"
        ),
    }
}
