// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::protocol::CloudApi;

use super::Coordinator;

/// Runs [`Coordinator::refresh`] on the configured interval and whenever
/// [`Coordinator::request_refresh`] is called.
///
/// The first poll runs immediately. A requested poll restarts the interval.
/// Requests that arrive while a poll is running collapse into exactly one
/// follow-up poll. Poll failures are logged and recorded in the store; the
/// loop keeps running.
#[derive(Debug)]
pub struct PollScheduler;

impl PollScheduler {
    /// Spawns the polling task on the current tokio runtime.
    ///
    /// The task stops when the returned handle is dropped or shut down.
    #[must_use = "dropping the handle stops polling"]
    pub fn start<A>(coordinator: Arc<Coordinator<A>>) -> PollHandle
    where
        A: CloudApi + 'static,
    {
        tracing::info!(
            interval_secs = coordinator.config().poll_interval().as_secs(),
            "Starting poll scheduler"
        );
        PollHandle {
            task: tokio::spawn(poll_loop(coordinator)),
        }
    }
}

/// Handle to a running [`PollScheduler`] task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops polling. A poll in progress is abandoned.
    pub fn shutdown(self) {
        tracing::info!("Stopping poll scheduler");
        self.task.abort();
    }

    /// Returns whether the polling task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop<A: CloudApi>(coordinator: Arc<Coordinator<A>>) {
    let period = coordinator.config().poll_interval();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::debug!("Scheduled poll");
            }
            () = coordinator.refresh_requested() => {
                tracing::debug!("Requested poll");
                ticker.reset_at(Instant::now() + period);
            }
        }

        if let Err(err) = coordinator.refresh().await {
            tracing::warn!(error = %err, "Poll cycle failed");
        }
    }
}
