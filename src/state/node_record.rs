// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical state of one hub.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Runtime;

use super::DeviceRecord;

/// Placeholder for node fields the cloud did not report.
pub const UNKNOWN: &str = "Unknown";

/// Canonical state of one physical hub and its devices.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use livhub_lib::state::{DeviceRecord, NodeRecord};
///
/// let node = NodeRecord::new("node-1", "Patio", true, Utc::now())
///     .with_serial("HUB-42")
///     .with_device(DeviceRecord::new("LIV Hub"));
///
/// assert_eq!(node.serial(), Some("HUB-42"));
/// assert!(node.device("LIV Hub").is_some());
/// assert_eq!(node.fw_version(), "Unknown");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    id: String,
    name: String,
    fw_version: String,
    model: String,
    serial: Option<String>,
    runtime: Runtime,
    online: bool,
    last_poll: DateTime<Utc>,
    devices: BTreeMap<String, DeviceRecord>,
}

impl NodeRecord {
    /// Creates a node with no devices and unknown firmware and model.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        online: bool,
        last_poll: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fw_version: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            serial: None,
            runtime: Runtime::default(),
            online,
            last_poll,
            devices: BTreeMap::new(),
        }
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_fw_version(mut self, fw_version: impl Into<String>) -> Self {
        self.fw_version = fw_version.into();
        self
    }

    /// Sets the display model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the hub serial.
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Sets the cumulative runtime.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Adds a device, replacing any device with the same name.
    #[must_use]
    pub fn with_device(mut self, device: DeviceRecord) -> Self {
        self.insert_device(device);
        self
    }

    /// Returns the vendor node id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn fw_version(&self) -> &str {
        &self.fw_version
    }

    /// Returns the display model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the hub serial, if reported.
    #[must_use]
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Returns the cumulative runtime.
    #[must_use]
    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// Returns whether the cloud reports the hub as connected.
    #[must_use]
    pub fn online(&self) -> bool {
        self.online
    }

    /// Returns when this record was fetched.
    #[must_use]
    pub fn last_poll(&self) -> DateTime<Utc> {
        self.last_poll
    }

    /// Returns a device by name.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceRecord> {
        self.devices.get(name)
    }

    /// Iterates over the devices in name order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.values()
    }

    /// Returns the number of devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub(crate) fn device_mut(&mut self, name: &str) -> Option<&mut DeviceRecord> {
        self.devices.get_mut(name)
    }

    pub(crate) fn insert_device(&mut self, device: DeviceRecord) {
        self.devices.insert(device.name().to_string(), device);
    }
}
