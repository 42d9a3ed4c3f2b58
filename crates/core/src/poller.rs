//! Presence-diff poll loop.
//!
//! One task, one timer. Each tick fetches a snapshot, applies it to the
//! [`PresenceState`] owned by the loop, and hands any change to a [`Notifier`].
//! No failure inside an iteration (fetch, send, timeout or panic) stops the loop.

use crate::error::PlayerWatchError;
use crate::notification::{NotificationFormatter, NotificationPayload};
use crate::presence::{PresenceDiff, PresenceState, Transition};
use crate::snapshot::SnapshotSource;
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Delivers a formatted notification to a channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
    ) -> Result<(), PlayerWatchError>;
}

/// Result of a single poll iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Offline,
    Idle,
    Unchanged,
    Notified(PresenceDiff),
    /// State advanced but the notification was not delivered
    NotifyFailed(PresenceDiff),
}

/// Poll loop settings
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub channel_id: String,
    pub interval: Duration,
    pub send_timeout: Duration,
}

pub struct PresencePoller<S, N> {
    source: S,
    notifier: N,
    formatter: NotificationFormatter,
    settings: PollerSettings,
}

impl<S, N> PresencePoller<S, N>
where
    S: SnapshotSource,
    N: Notifier,
{
    pub fn new(
        source: S,
        notifier: N,
        formatter: NotificationFormatter,
        settings: PollerSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            formatter,
            settings,
        }
    }

    /// Run one iteration against `state`
    pub async fn poll_once(&self, state: &mut PresenceState) -> PollOutcome {
        let snapshot = self.source.fetch().await;

        let diff = match state.apply(&snapshot) {
            Transition::Offline => {
                debug!("Server offline or unreachable, skipping");
                return PollOutcome::Offline;
            }
            Transition::Idle => return PollOutcome::Idle,
            Transition::Unchanged => return PollOutcome::Unchanged,
            Transition::Changed(diff) => diff,
        };

        let payload = self
            .formatter
            .format(&diff.joined, &diff.left, snapshot.player_count);

        let sent = tokio::time::timeout(
            self.settings.send_timeout,
            self.notifier.notify(&self.settings.channel_id, &payload),
        )
        .await;

        match sent {
            Ok(Ok(())) => {
                info!(
                    "Sent update: {} joined, {} left",
                    diff.joined.len(),
                    diff.left.len()
                );
                PollOutcome::Notified(diff)
            }
            Ok(Err(e)) => {
                error!(channel = %self.settings.channel_id, "Failed to send update: {}", e);
                PollOutcome::NotifyFailed(diff)
            }
            Err(_) => {
                error!(
                    channel = %self.settings.channel_id,
                    timeout_secs = self.settings.send_timeout.as_secs(),
                    "Timed out sending update"
                );
                PollOutcome::NotifyFailed(diff)
            }
        }
    }

    /// Poll on a fixed cadence until `shutdown` resolves, returning the final state
    pub async fn run_until<F>(&self, mut state: PresenceState, shutdown: F) -> PresenceState
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.settings.interval.as_secs(),
            "Presence poller started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let iteration = AssertUnwindSafe(self.poll_once(&mut state))
                .catch_unwind()
                .await;

            if let Err(panic) = iteration {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Error in poll iteration: {}", message);
            }
        }

        warn!("Presence poller stopped");
        state
    }
}
