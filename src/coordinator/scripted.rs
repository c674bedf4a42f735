// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory cloud used by coordinator tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::RequestError;
use crate::protocol::CloudApi;

#[derive(Debug, Clone)]
struct ScriptedNode {
    params: Value,
    status: Value,
}

#[derive(Debug, Default)]
struct Script {
    nodes: BTreeMap<String, ScriptedNode>,
    fail_list: bool,
    fail_config: bool,
    fail_writes: bool,
    apply_writes: bool,
    list_delay: Option<Duration>,
    config_delay: Option<Duration>,
    writes: Vec<(String, Value)>,
}

/// A [`CloudApi`] answering from a mutable script.
#[derive(Debug, Default)]
pub(crate) struct ScriptedApi {
    script: Mutex<Script>,
    list_calls: AtomicUsize,
}

fn scripted_failure() -> RequestError {
    RequestError::Status {
        status: 500,
        body: "scripted failure".to_string(),
    }
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a node with one `LIV Hub` device, powered off, LED at 50%.
    pub(crate) fn with_hub(self, node_id: &str, name: &str, online: bool) -> Self {
        self.script.lock().nodes.insert(
            node_id.to_string(),
            ScriptedNode {
                params: json!({
                    "LIV Hub": {
                        "Name": name,
                        "Hub ID": format!("SERIAL-{node_id}"),
                        "LED Hue": 120,
                        "LED Brightness": 50,
                        "Enable Repellers": false,
                        "System Status": 1,
                        "Error": 0,
                        "Refill Life": 80,
                        "System Runtime": 90
                    }
                }),
                status: json!({
                    "connectivity": {"connected": online, "timestamp": 1_757_107_867_638_i64}
                }),
            },
        );
        self
    }

    pub(crate) fn remove_node(&self, node_id: &str) {
        self.script.lock().nodes.remove(node_id);
    }

    pub(crate) fn set_param(&self, node_id: &str, key: &str, value: Value) {
        if let Some(node) = self.script.lock().nodes.get_mut(node_id) {
            node.params["LIV Hub"][key] = value;
        }
    }

    pub(crate) fn set_status(&self, node_id: &str, status: Value) {
        if let Some(node) = self.script.lock().nodes.get_mut(node_id) {
            node.status = status;
        }
    }

    pub(crate) fn fail_list(&self, fail: bool) {
        self.script.lock().fail_list = fail;
    }

    pub(crate) fn fail_config(&self, fail: bool) {
        self.script.lock().fail_config = fail;
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.script.lock().fail_writes = fail;
    }

    /// Merges accepted writes into the node's params.
    pub(crate) fn apply_writes(&self, apply: bool) {
        self.script.lock().apply_writes = apply;
    }

    pub(crate) fn set_list_delay(&self, delay: Duration) {
        self.script.lock().list_delay = Some(delay);
    }

    /// Delays config reads, which come after params and status in a poll.
    pub(crate) fn set_config_delay(&self, delay: Option<Duration>) {
        self.script.lock().config_delay = delay;
    }

    pub(crate) fn writes(&self) -> Vec<(String, Value)> {
        self.script.lock().writes.clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn node(&self, node_id: &str) -> Result<ScriptedNode, RequestError> {
        self.script
            .lock()
            .nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| RequestError::Status {
                status: 404,
                body: format!("unknown node {node_id}"),
            })
    }
}

impl CloudApi for ScriptedApi {
    async fn list_node_ids(&self) -> Result<Vec<String>, RequestError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.script.lock().list_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let script = self.script.lock();
        if script.fail_list {
            return Err(scripted_failure());
        }
        Ok(script.nodes.keys().cloned().collect())
    }

    async fn node_params(&self, node_id: &str) -> Result<Value, RequestError> {
        self.node(node_id).map(|node| node.params)
    }

    async fn node_status(&self, node_id: &str) -> Result<Value, RequestError> {
        self.node(node_id).map(|node| node.status)
    }

    async fn node_config(&self, node_id: &str) -> Result<Value, RequestError> {
        self.node(node_id)?;
        let delay = self.script.lock().config_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.lock().fail_config {
            return Err(scripted_failure());
        }
        Ok(json!({"info": {"fw_version": "5.3.2", "model": "thermacell-hub"}}))
    }

    async fn set_node_params(&self, node_id: &str, params: Value) -> Result<(), RequestError> {
        let mut script = self.script.lock();
        if script.fail_writes {
            return Err(scripted_failure());
        }
        if script.apply_writes
            && let (Some(node), Some(devices)) = (script.nodes.get_mut(node_id), params.as_object())
        {
            for (device, fields) in devices {
                for (key, value) in fields.as_object().into_iter().flatten() {
                    node.params[device.as_str()][key.as_str()] = value.clone();
                }
            }
        }
        script.writes.push((node_id.to_string(), params));
        Ok(())
    }
}
