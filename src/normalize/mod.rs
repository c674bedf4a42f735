// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion of vendor payloads into canonical records.
//!
//! The cloud reports a node as three loosely shaped JSON documents:
//!
//! - **params**: a map from device display name (e.g. `"LIV Hub"`) to that
//!   device's parameters, alongside unrelated service entries
//! - **status**: `{"connectivity": {"connected": bool, "timestamp": ms}}`
//! - **config**: `{"info": {"fw_version": .., "model": ..}}`
//!
//! [`normalize`] turns them into a [`NodeRecord`]. It is a pure function:
//! the same [`RawNode`] always yields the same record.
//!
//! # Conversions
//!
//! | Vendor field | Record field |
//! |--------------|--------------|
//! | `Enable Repellers` | `power` |
//! | `LED Brightness` (0-100) | `led_brightness_pct`, `led_brightness` (0-255, rounded half away from zero) |
//! | `LED Hue` (0-360) | `led_hue`; with brightness as HSV value and full saturation, `led_color` |
//! | `Refill Life` | `refill_life` |
//! | `System Status`, `Error` | `system_status_code`, `error_code`, `system_status` |
//! | `System Runtime` | node `runtime` |
//! | `Hub ID` | node `serial` |
//! | `Name` | node `name` |

pub(crate) mod payload;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::state::{DeviceRecord, NodeRecord};
use crate::types::{BrightnessPct, Hue, Runtime};

use payload::{ConfigPayload, HubParams, StatusPayload, is_device_blob, parse_device};

/// Raw model id of the LIV hub.
pub const HUB_MODEL_ID: &str = "thermacell-hub";

/// Display name for [`HUB_MODEL_ID`].
pub const HUB_MODEL_NAME: &str = "Thermacell LIV Hub";

/// Everything fetched for one node during a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    node_id: String,
    params: Value,
    status: Value,
    config: Option<Value>,
    fetched_at: DateTime<Utc>,
}

impl RawNode {
    /// Bundles the params and status payloads of a node.
    #[must_use]
    pub fn new(
        node_id: impl Into<String>,
        params: Value,
        status: Value,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            params,
            status,
            config: None,
            fetched_at,
        }
    }

    /// Adds the config payload.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Returns the node id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

/// Normalizes one node.
///
/// # Errors
///
/// Returns [`ParseError`] if the status payload has no connectivity
/// object, the params hold no device, or a device's fields have the wrong
/// types. The caller omits such a node from the poll result.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use livhub_lib::normalize::{RawNode, normalize};
/// use livhub_lib::types::SystemStatus;
/// use serde_json::json;
///
/// let raw = RawNode::new(
///     "node-1",
///     json!({"LIV Hub": {
///         "Name": "Patio",
///         "Enable Repellers": true,
///         "LED Hue": 120,
///         "LED Brightness": 100,
///         "System Status": 3,
///         "Error": 0,
///         "Refill Life": 75,
///     }}),
///     json!({"connectivity": {"connected": true, "timestamp": 1757107867638_i64}}),
///     Utc::now(),
/// );
///
/// let node = normalize(&raw).unwrap();
/// let hub = node.device("LIV Hub").unwrap();
/// assert_eq!(node.name(), "Patio");
/// assert_eq!(hub.system_status(), SystemStatus::Protected);
/// assert_eq!(hub.led_color().to_hex_with_hash(), "#00FF00");
/// assert_eq!(hub.last_updated(), 1757107867);
/// ```
pub fn normalize(raw: &RawNode) -> Result<NodeRecord, ParseError> {
    let status = StatusPayload::deserialize(&raw.status)?;
    let connectivity = status
        .connectivity
        .ok_or_else(|| ParseError::MissingField("connectivity".to_string()))?;
    let online = connectivity.connected;
    let last_updated = connectivity
        .timestamp
        .map_or_else(|| raw.fetched_at.timestamp(), |ms| ms.div_euclid(1000));

    let Some(entries) = raw.params.as_object() else {
        return Err(ParseError::UnexpectedFormat(format!(
            "params of node {} are not an object",
            raw.node_id
        )));
    };

    let mut blobs = Vec::new();
    for (name, value) in entries.iter().filter(|(_, value)| is_device_blob(value)) {
        blobs.push((name.as_str(), parse_device(name, value)?));
    }
    if blobs.is_empty() {
        return Err(ParseError::MissingField(format!(
            "device parameters for node {}",
            raw.node_id
        )));
    }

    let name = blobs
        .iter()
        .find_map(|(_, params)| params.name.clone().filter(|n| !n.is_empty()))
        .unwrap_or_else(|| format!("Node {}", raw.node_id));
    let serial = blobs.iter().find_map(|(_, params)| params.serial());
    let runtime = blobs
        .iter()
        .find_map(|(_, params)| params.system_runtime)
        .map(runtime_from)
        .unwrap_or_default();

    let mut node = NodeRecord::new(&raw.node_id, name, online, raw.fetched_at).with_runtime(runtime);
    if let Some(serial) = serial {
        node = node.with_serial(serial);
    }
    if let Some(info) = raw
        .config
        .as_ref()
        .and_then(|config| ConfigPayload::deserialize(config).ok())
        .and_then(|config| config.info)
    {
        if let Some(fw_version) = info.fw_version {
            node = node.with_fw_version(fw_version);
        }
        if let Some(model) = info.model {
            node = node.with_model(display_model(&model));
        }
    }

    for (device_name, params) in &blobs {
        node = node.with_device(device_from(device_name, params, online, last_updated));
    }

    Ok(node)
}

/// Returns the display name for a raw model id.
#[must_use]
pub fn display_model(model: &str) -> String {
    if model == HUB_MODEL_ID {
        HUB_MODEL_NAME.to_string()
    } else {
        model.to_string()
    }
}

fn device_from(name: &str, params: &HubParams, online: bool, last_updated: i64) -> DeviceRecord {
    let mut device = DeviceRecord::new(name);
    device.set_power(params.enable_repellers.unwrap_or(false));
    device.set_led_color(
        Hue::wrapped(round(params.led_hue.unwrap_or(0.0))),
        BrightnessPct::clamped(round(params.led_brightness.unwrap_or(0.0))),
    );
    device.set_refill_life(params.refill_life.unwrap_or(0.0));
    device.set_codes(
        round(params.system_status.unwrap_or(0.0)),
        round(params.error.unwrap_or(0.0)),
    );
    device.set_last_updated(last_updated);
    device.refresh_status(online);
    device
}

fn runtime_from(minutes: f64) -> Runtime {
    u64::try_from(round(minutes))
        .map(Runtime::from_minutes)
        .unwrap_or_default()
}

/// Rounds half away from zero, saturating at the `i64` range.
#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    // `as` saturates for out-of-range floats
    value.round() as i64
}
