//! Location watcher.
//!
//! The host navigates between videos without reloading the page. A single
//! [`LocationWatcher`] task detects this from two sources, document
//! mutations and a bounded fallback poll, and reports each observed
//! location once over an `mpsc` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use ytnote_core::types::VideoId;
use ytnote_core::video_url::video_id_from_url;

use crate::config::OverlayConfig;
use crate::host::HostPage;

/// Buffer for undelivered location changes.
const LOCATION_CHANNEL_CAPACITY: usize = 16;

/// A location the watcher observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub url: String,
    /// The video shown at `url`, `None` off watch pages.
    pub video_id: Option<VideoId>,
}

impl LocationChange {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let video_id = video_id_from_url(&url);
        Self { url, video_id }
    }
}

/// Poll settings for the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Ticks allowed after start or after the last observed navigation.
    pub max_ticks: u32,
}

impl From<&OverlayConfig> for PollPolicy {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_ticks: config.max_poll_ticks,
        }
    }
}

/// Background task reporting location changes.
pub struct LocationWatcher;

impl LocationWatcher {
    /// Start watching `host`.
    ///
    /// The current location is reported immediately. The task ends when
    /// `cancel` fires or the receiver is dropped.
    pub fn spawn<H: HostPage>(
        host: Arc<H>,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<LocationChange> {
        let (tx, rx) = mpsc::channel(LOCATION_CHANNEL_CAPACITY);
        let mutations = host.mutations();
        tokio::spawn(Self::run(host, policy, mutations, tx, cancel));
        rx
    }

    async fn run<H: HostPage>(
        host: Arc<H>,
        policy: PollPolicy,
        mut mutations: broadcast::Receiver<()>,
        tx: mpsc::Sender<LocationChange>,
        cancel: CancellationToken,
    ) {
        let mut last = host.location();
        if tx.send(LocationChange::new(last.clone())).await.is_err() {
            return;
        }

        let mut mutations_open = true;
        let mut poll = poll_timer(policy.interval);
        let mut ticks_left = policy.max_ticks;

        loop {
            let observed = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Location watcher cancelled");
                    break;
                }
                received = mutations.recv(), if mutations_open => match received {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => host.location(),
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Host mutation feed closed, relying on poll");
                        mutations_open = false;
                        continue;
                    }
                },
                _ = poll.tick(), if ticks_left > 0 => {
                    ticks_left -= 1;
                    host.location()
                }
            };

            if observed == last {
                continue;
            }

            tracing::debug!(url = %observed, "Location changed");
            last = observed.clone();
            ticks_left = policy.max_ticks;
            poll = poll_timer(policy.interval);

            if tx.send(LocationChange::new(observed)).await.is_err() {
                break;
            }
        }
    }
}

/// An interval whose first tick is one period from now.
fn poll_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_change_extracts_video_id() {
        let change = LocationChange::new("https://www.youtube.com/watch?v=abc&t=3s");
        assert_eq!(change.video_id.as_deref(), Some("abc"));
        assert_eq!(LocationChange::new("https://www.youtube.com/feed").video_id, None);
    }
}
