// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the vendor cloud.
//!
//! # Layers
//!
//! - [`ApiConfig`]: account, endpoint, timeout and retry settings
//! - [`Transport`]: authenticated JSON requests with 401 and timeout
//!   handling
//! - [`RainmakerClient`]: the node endpoints, exposed through [`CloudApi`]
//!
//! The coordinator only depends on [`CloudApi`], so tests can substitute a
//! scripted implementation for the HTTP client.

mod config;
mod rainmaker;
mod transport;

pub use config::ApiConfig;
pub use rainmaker::RainmakerClient;
pub use transport::Transport;

use std::future::Future;

use serde_json::Value;

use crate::error::RequestError;

/// Node-level operations of the vendor cloud.
///
/// Responses are returned as raw JSON; turning them into records is the
/// job of [`crate::normalize`].
pub trait CloudApi: Send + Sync {
    /// Lists the ids of every node on the account.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the request fails.
    fn list_node_ids(&self) -> impl Future<Output = Result<Vec<String>, RequestError>> + Send;

    /// Reads the parameter map of a node.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the request fails.
    fn node_params(
        &self,
        node_id: &str,
    ) -> impl Future<Output = Result<Value, RequestError>> + Send;

    /// Reads the connectivity status of a node.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the request fails.
    fn node_status(
        &self,
        node_id: &str,
    ) -> impl Future<Output = Result<Value, RequestError>> + Send;

    /// Reads the static configuration of a node.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the request fails.
    fn node_config(
        &self,
        node_id: &str,
    ) -> impl Future<Output = Result<Value, RequestError>> + Send;

    /// Writes parameters to a node.
    ///
    /// `params` maps a device name to the fields to change on it.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the request fails.
    fn set_node_params(
        &self,
        node_id: &str,
        params: Value,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}
