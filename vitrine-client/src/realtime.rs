//! Realtime subscription handles and the polling fallback
//!
//! The direct REST backend has no push mechanism, so subscriptions degrade
//! to a fixed-rate poll that invokes the callback with a `Refresh` change.
//! The hosted backend delivers genuine pushes (see [`crate::push`]). Either
//! way the caller gets a [`Subscription`] whose cancellation is mandatory
//! cleanup, not optional.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use shared::TableChange;

use crate::gateway::ChangeCallback;

/// Active table subscription.
///
/// `unsubscribe()` stops further callback invocations. Dropping the handle
/// cancels too, so an abandoned subscription cannot leak its task.
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the subscription; no callback fires after this returns.
    pub fn unsubscribe(self) {
        self.token.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn the polling fallback for `table`.
///
/// Fixed cadence, no jitter — every tick tells the subscriber to refetch.
pub(crate) fn spawn_polling(
    table: &str,
    interval: Duration,
    callback: ChangeCallback,
) -> Subscription {
    let token = CancellationToken::new();
    let task_token = token.clone();
    let table = table.to_string();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick of a tokio interval completes immediately
        ticker.tick().await;
        tracing::debug!(table = %table, ?interval, "polling subscription started");
        loop {
            tokio::select! {
                _ = task_token.cancelled() => {
                    tracing::debug!(table = %table, "polling subscription stopped");
                    break;
                }
                _ = ticker.tick() => {
                    callback(TableChange::refresh(&table));
                }
            }
        }
    });

    Subscription::new(token)
}
