// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling and commands for every hub on an account.
//!
//! The [`Coordinator`] owns the cloud client and the
//! [`StateStore`]. A poll fetches and normalizes every node, then commits
//! the result to the store; commands write to the cloud and patch one
//! device in the store. [`PollScheduler`] runs polls on an interval and on
//! demand.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use livhub_lib::coordinator::{Coordinator, CoordinatorConfig, PollScheduler};
//! use livhub_lib::protocol::ApiConfig;
//!
//! # async fn example() -> livhub_lib::Result<()> {
//! let api = ApiConfig::new("user@example.com", "password");
//! let coordinator = Arc::new(Coordinator::connect(api, CoordinatorConfig::default())?);
//!
//! coordinator.refresh().await?;
//! let poller = PollScheduler::start(Arc::clone(&coordinator));
//!
//! for node in coordinator.store().nodes() {
//!     for device in node.devices() {
//!         coordinator.set_device_power(node.id(), device.name(), true).await?;
//!     }
//! }
//!
//! poller.shutdown();
//! # Ok(())
//! # }
//! ```

mod commands;
mod config;
mod poll;

#[cfg(test)]
pub(crate) mod scripted;

pub use config::{CommandPolicy, CoordinatorConfig};
pub use poll::{PollHandle, PollScheduler};

use chrono::Utc;
use tokio::sync::{Mutex, Notify, broadcast};

use crate::error::{Error, RequestError, UpdateFailed};
use crate::event::{EventBus, StoreEvent};
use crate::normalize::{RawNode, normalize};
use crate::protocol::{ApiConfig, CloudApi, RainmakerClient};
use crate::state::{DeviceRecord, NodeRecord, StateStore};

/// Keeps the [`StateStore`] in sync with the cloud and issues commands.
///
/// Share it behind an `Arc` between the host, which reads the store and
/// issues commands, and the [`PollScheduler`].
#[derive(Debug)]
pub struct Coordinator<A> {
    api: A,
    store: StateStore,
    config: CoordinatorConfig,
    refresh: Notify,
    poll_lock: Mutex<()>,
}

impl Coordinator<RainmakerClient> {
    /// Creates a coordinator talking to the vendor cloud.
    ///
    /// No request is made until the first poll or command.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built from `api`.
    pub fn connect(api: ApiConfig, config: CoordinatorConfig) -> Result<Self, RequestError> {
        Ok(Self::new(api.into_client()?, config))
    }
}

impl<A: CloudApi> Coordinator<A> {
    /// Creates a coordinator over any [`CloudApi`].
    #[must_use]
    pub fn new(api: A, config: CoordinatorConfig) -> Self {
        let store = StateStore::with_event_bus(EventBus::with_capacity(config.event_capacity()));
        Self {
            api,
            store,
            config,
            refresh: Notify::new(),
            poll_lock: Mutex::new(()),
        }
    }

    /// Returns the cloud client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the state store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Subscribes to store events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Returns a device's current record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the store has no such device.
    pub fn device(&self, node_id: &str, device_name: &str) -> crate::Result<DeviceRecord> {
        self.store
            .device(node_id, device_name)
            .ok_or_else(|| Error::DeviceNotFound {
                node_id: node_id.to_string(),
                device_name: device_name.to_string(),
            })
    }

    /// Returns whether the node list can be fetched with the configured
    /// account.
    pub async fn test_connection(&self) -> bool {
        match self.api.list_node_ids().await {
            Ok(ids) => {
                tracing::info!(nodes = ids.len(), "Connection test succeeded");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Connection test failed");
                false
            }
        }
    }

    /// Asks the [`PollScheduler`] to poll as soon as possible.
    ///
    /// Requests made while a poll is running collapse into one follow-up
    /// poll.
    pub fn request_refresh(&self) {
        tracing::debug!("Refresh requested");
        self.refresh.notify_one();
    }

    /// Resolves when a refresh has been requested.
    pub(crate) async fn refresh_requested(&self) {
        self.refresh.notified().await;
    }

    /// Polls every node and commits the result to the store.
    ///
    /// Nodes that fail to fetch or normalize are left out of the result.
    /// On failure the store keeps its records and is marked stale.
    ///
    /// Polls never overlap: a call made while another poll is running waits
    /// for it to commit, then polls again.
    ///
    /// Returns the number of nodes committed.
    ///
    /// # Errors
    ///
    /// - [`UpdateFailed::Request`] if the node list cannot be fetched
    /// - [`UpdateFailed::NoNodes`] if the account has no nodes
    /// - [`UpdateFailed::NoUsableNodes`] if no node produced a record
    pub async fn refresh(&self) -> Result<usize, UpdateFailed> {
        let _poll = self.poll_lock.lock().await;
        let started = self.store.generation();

        match self.fetch_all().await {
            Ok(records) => {
                let count = records.len();
                match self.store.reconcile(started, records) {
                    Some(kept) => {
                        tracing::debug!(nodes = count, kept_optimistic = kept, "Poll committed");
                    }
                    None => tracing::debug!(nodes = count, "Poll superseded by a newer commit"),
                }
                Ok(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "Poll failed");
                self.store.mark_stale(err.to_string());
                Err(err)
            }
        }
    }

    async fn fetch_all(&self) -> Result<Vec<NodeRecord>, UpdateFailed> {
        let node_ids = self.api.list_node_ids().await?;
        if node_ids.is_empty() {
            return Err(UpdateFailed::NoNodes);
        }

        let mut records = Vec::with_capacity(node_ids.len());
        for node_id in &node_ids {
            let raw = match self.fetch_node(node_id).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(node_id = %node_id, error = %err, "Skipping node, fetch failed");
                    continue;
                }
            };
            match normalize(&raw) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(node_id = %node_id, error = %err, "Skipping node, unusable state");
                }
            }
        }

        if records.is_empty() {
            return Err(UpdateFailed::NoUsableNodes {
                attempted: node_ids.len(),
            });
        }
        Ok(records)
    }

    async fn fetch_node(&self, node_id: &str) -> Result<RawNode, RequestError> {
        let params = self.api.node_params(node_id).await?;
        let status = self.api.node_status(node_id).await?;
        let raw = RawNode::new(node_id, params, status, Utc::now());

        match self.api.node_config(node_id).await {
            Ok(config) => Ok(raw.with_config(config)),
            Err(err) => {
                tracing::debug!(node_id, error = %err, "Node config unavailable");
                Ok(raw)
            }
        }
    }
}
