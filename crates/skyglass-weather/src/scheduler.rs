//! Update loop: one pending task at a time, rescheduled after each cycle.

use chrono::Utc;
use skyglass_core::{ForecastConfig, HostModule, Node, Notification};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::location::{locate_within, Geolocator};
use crate::provider::WeatherSource;
use crate::store::KeyValueStore;
use crate::widget::{CycleOutcome, ForecastWidget};

/// How often a cycle waiting on the location lookup checks again.
pub const LOCATION_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("An update is already scheduled")]
    AlreadyPending,
}

/// Holds the single pending update, if any.
#[derive(Debug, Default)]
pub struct Schedule {
    pending: Option<Instant>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next update `delay` from now.
    pub fn enqueue(&mut self, delay: Duration) -> Result<(), ScheduleError> {
        if self.pending.is_some() {
            return Err(ScheduleError::AlreadyPending);
        }
        self.pending = Some(Instant::now() + delay);
        Ok(())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear the pending update, returning when it was due.
    pub fn take(&mut self) -> Option<Instant> {
        self.pending.take()
    }
}

/// Delay before the cycle that follows `outcome`; `None` stops updates.
pub fn next_delay(outcome: CycleOutcome, config: &ForecastConfig) -> Option<Duration> {
    match outcome {
        CycleOutcome::Fetched | CycleOutcome::ServedCache | CycleOutcome::Failed => {
            Some(config.update_interval())
        }
        CycleOutcome::AwaitingLocation => Some(LOCATION_RETRY_INTERVAL),
        CycleOutcome::Halted => None,
    }
}

/// Drive `widget` until `cancel` fires.
///
/// The first cycle runs after the configured initial delay. The location
/// lookup (when needed) and host notifications are handled as they arrive.
/// `on_render` receives a fresh tree after every change.
pub async fn run_updates<S, K, G, F>(
    widget: &mut ForecastWidget<S, K>,
    geolocator: &G,
    mut notifications: mpsc::Receiver<Notification>,
    cancel: CancellationToken,
    mut on_render: F,
) where
    S: WeatherSource,
    K: KeyValueStore,
    G: Geolocator,
    F: FnMut(Node),
{
    let mut schedule = Schedule::new();
    if let Err(e) = schedule.enqueue(widget.config().initial_load_delay()) {
        tracing::warn!("{}", e);
    }

    let lookup = locate_within(geolocator, widget.config().geolocation_timeout());
    tokio::pin!(lookup);
    let mut lookup_done = !widget.needs_location();
    let mut notifications_open = true;

    on_render(widget.on_render());

    loop {
        let deadline = schedule.deadline();

        tokio::select! {
            _ = cancel.cancelled() => break,

            result = &mut lookup, if !lookup_done => {
                lookup_done = true;
                widget.set_location(result);
                on_render(widget.on_render());
            }

            received = notifications.recv(), if notifications_open => match received {
                Some(notification) => {
                    tracing::debug!(?notification, "Notification received");
                    widget.on_notify(&notification);
                    on_render(widget.on_render());
                }
                None => notifications_open = false,
            },

            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                schedule.take();

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = widget.update_cycle(Utc::now()) => outcome,
                };
                tracing::debug!(?outcome, "Update cycle finished");
                on_render(widget.on_render());

                match next_delay(outcome, widget.config()) {
                    Some(delay) => {
                        if let Err(e) = schedule.enqueue(delay) {
                            tracing::warn!("{}", e);
                        }
                    }
                    None => tracing::warn!("Automatic forecast updates stopped"),
                }
            }
        }
    }

    tracing::info!("Update loop stopped");
}
