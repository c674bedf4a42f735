// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node endpoints of the vendor cloud.

use serde_json::Value;

use crate::error::RequestError;

use super::{CloudApi, Transport};

const NODES_PATH: &str = "/user/nodes";
const PARAMS_PATH: &str = "/user/nodes/params";
const STATUS_PATH: &str = "/user/nodes/status";
const CONFIG_PATH: &str = "/user/nodes/config";

/// Client for the node endpoints.
///
/// Every call goes through the [`Transport`], so authentication, the 401
/// retry and timeout retries apply uniformly.
///
/// # Examples
///
/// ```no_run
/// use livhub_lib::protocol::{ApiConfig, CloudApi};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiConfig::new("user@example.com", "password").into_client()?;
///
/// for node_id in client.list_node_ids().await? {
///     let params = client.node_params(&node_id).await?;
///     println!("{node_id}: {params}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RainmakerClient {
    transport: Transport,
}

impl RainmakerClient {
    /// Creates a client over an existing transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

fn node_path(base: &str, node_id: &str) -> String {
    format!("{base}?nodeid={}", urlencoding::encode(node_id))
}

fn node_ids_from(response: &Value) -> Vec<String> {
    let Some(nodes) = response.get("nodes").and_then(Value::as_array) else {
        tracing::debug!("Node list response has no nodes array");
        return Vec::new();
    };

    nodes
        .iter()
        .filter_map(|node| match node {
            Value::String(id) => Some(id.clone()),
            other => {
                tracing::debug!(entry = %other, "Skipping non-string node id");
                None
            }
        })
        .collect()
}

impl CloudApi for RainmakerClient {
    async fn list_node_ids(&self) -> Result<Vec<String>, RequestError> {
        let response = self.transport.get(NODES_PATH).await?;
        Ok(node_ids_from(&response))
    }

    async fn node_params(&self, node_id: &str) -> Result<Value, RequestError> {
        self.transport.get(&node_path(PARAMS_PATH, node_id)).await
    }

    async fn node_status(&self, node_id: &str) -> Result<Value, RequestError> {
        self.transport.get(&node_path(STATUS_PATH, node_id)).await
    }

    async fn node_config(&self, node_id: &str) -> Result<Value, RequestError> {
        self.transport.get(&node_path(CONFIG_PATH, node_id)).await
    }

    async fn set_node_params(&self, node_id: &str, params: Value) -> Result<(), RequestError> {
        tracing::debug!(node_id, params = %params, "Setting node parameters");
        self.transport
            .put(&node_path(PARAMS_PATH, node_id), &params)
            .await
            .map(|_| ())
    }
}
