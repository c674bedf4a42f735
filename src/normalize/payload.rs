// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor payload shapes.
//!
//! These mirror the cloud's JSON closely and never leave the normalizer.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;

/// Parameter keys that mark an object in the params map as a device blob.
pub(crate) const DEVICE_KEYS: [&str; 6] = [
    HubParams::ENABLE_REPELLERS,
    HubParams::LED_BRIGHTNESS,
    HubParams::LED_HUE,
    HubParams::SYSTEM_STATUS,
    HubParams::REFILL_LIFE,
    HubParams::ERROR,
];

/// Parameters of one device blob, e.g. the value under `"LIV Hub"`.
///
/// Numbers are read as `f64` because the cloud is not consistent about
/// sending integers.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HubParams {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Hub ID", default)]
    pub hub_id: Option<Value>,
    #[serde(rename = "LED Hue", default)]
    pub led_hue: Option<f64>,
    #[serde(rename = "LED Brightness", default)]
    pub led_brightness: Option<f64>,
    #[serde(rename = "Enable Repellers", default)]
    pub enable_repellers: Option<bool>,
    #[serde(rename = "System Status", default)]
    pub system_status: Option<f64>,
    #[serde(rename = "Error", default)]
    pub error: Option<f64>,
    #[serde(rename = "Refill Life", default)]
    pub refill_life: Option<f64>,
    #[serde(rename = "System Runtime", default)]
    pub system_runtime: Option<f64>,
}

impl HubParams {
    pub const ENABLE_REPELLERS: &'static str = "Enable Repellers";
    pub const LED_BRIGHTNESS: &'static str = "LED Brightness";
    pub const LED_HUE: &'static str = "LED Hue";
    pub const SYSTEM_STATUS: &'static str = "System Status";
    pub const REFILL_LIFE: &'static str = "Refill Life";
    pub const REFILL_RESET: &'static str = "Refill Reset";
    pub const ERROR: &'static str = "Error";

    /// Returns the hub serial as text, whether sent as a string or number.
    pub fn serial(&self) -> Option<String> {
        match self.hub_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Returns whether a params-map entry looks like a device blob.
pub(crate) fn is_device_blob(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|fields| DEVICE_KEYS.iter().any(|key| fields.contains_key(*key)))
}

/// Decodes one device blob.
pub(crate) fn parse_device(name: &str, value: &Value) -> Result<HubParams, ParseError> {
    HubParams::deserialize(value).map_err(|e| ParseError::InvalidValue {
        field: name.to_string(),
        message: e.to_string(),
    })
}

/// The node status payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusPayload {
    #[serde(default)]
    pub connectivity: Option<Connectivity>,
}

/// Connectivity sub-object of the status payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Connectivity {
    #[serde(default)]
    pub connected: bool,
    /// Last report, in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// The node configuration payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ConfigPayload {
    #[serde(default)]
    pub info: Option<NodeInfo>,
}

/// Static node information.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct NodeInfo {
    #[serde(default)]
    pub fw_version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}
