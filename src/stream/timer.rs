//! Cancellable scheduled tasks
//!
//! A [`ScheduledTask`] is the cancellation token for a timer running on the
//! Tokio runtime. Cancelling or dropping it aborts the timer. Each task carries
//! a ticket so a callback that raced with its own cancellation can tell it is
//! stale and do nothing.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Ticket identifying one scheduled timer
pub type Ticket = u64;

/// Handle to a running timer
#[derive(Debug)]
pub struct ScheduledTask {
    ticket: Ticket,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Run `fire` once after `delay`
    pub fn once<F>(ticket: Ticket, delay: Duration, fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            fire();
        });
        Self {
            ticket,
            handle: Some(handle),
        }
    }

    /// Run `tick` every `interval` until `timeout` elapses, then run `expire`.
    ///
    /// The first tick happens one full interval after scheduling. When a tick
    /// and the deadline coincide the deadline wins.
    pub fn repeating<F, G>(
        ticket: Ticket,
        interval: Duration,
        timeout: Duration,
        mut tick: F,
        expire: G,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
        G: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let mut ticker = time::interval_at(start + interval, interval);
            let deadline = time::sleep_until(start + timeout);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut deadline => {
                        expire();
                        break;
                    }
                    _ = ticker.tick() => tick(),
                }
            }
        });
        Self {
            ticket,
            handle: Some(handle),
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Abort the timer. A callback already running finishes its current call.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Release the handle without aborting. Used by a timer's own callback
    /// when it clears itself from the controller state.
    pub fn finish(mut self) {
        self.handle.take();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Cancel whatever timer occupies `slot`, then install `task`
pub fn replace(slot: &mut Option<ScheduledTask>, task: ScheduledTask) {
    if let Some(previous) = slot.take() {
        tracing::debug!(ticket = previous.ticket(), "cancelling superseded timer");
        previous.cancel();
    }
    *slot = Some(task);
}

/// Cancel whatever timer occupies `slot`
pub fn clear(slot: &mut Option<ScheduledTask>) {
    if let Some(previous) = slot.take() {
        previous.cancel();
    }
}
