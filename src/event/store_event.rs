// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State store event types.

/// Events emitted by the state store.
///
/// Consumers re-read the store after an event; events carry keys, not
/// records.
///
/// # Examples
///
/// ```
/// use livhub_lib::event::StoreEvent;
///
/// let event = StoreEvent::device_updated("node-1", "LIV Hub");
/// assert_eq!(event.device_key(), Some(("node-1", "LIV Hub")));
///
/// let failed = StoreEvent::UpdateFailed { reason: "no nodes found".into() };
/// assert_eq!(failed.device_key(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreEvent {
    /// A poll committed a new set of nodes.
    Replaced {
        /// Store generation after the commit.
        generation: u64,
        /// Number of nodes now in the store.
        nodes: usize,
        /// Devices whose optimistic record survived the commit.
        kept_optimistic: usize,
    },

    /// One device was patched optimistically.
    DeviceUpdated {
        /// Node owning the device.
        node_id: String,
        /// Device name within the node.
        device_name: String,
    },

    /// One device was restored after a failed command.
    DeviceReverted {
        /// Node owning the device.
        node_id: String,
        /// Device name within the node.
        device_name: String,
    },

    /// A poll failed; the store kept its previous contents.
    UpdateFailed {
        /// Why the poll failed.
        reason: String,
    },
}

impl StoreEvent {
    /// Creates a [`StoreEvent::DeviceUpdated`].
    #[must_use]
    pub fn device_updated(node_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self::DeviceUpdated {
            node_id: node_id.into(),
            device_name: device_name.into(),
        }
    }

    /// Creates a [`StoreEvent::DeviceReverted`].
    #[must_use]
    pub fn device_reverted(node_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self::DeviceReverted {
            node_id: node_id.into(),
            device_name: device_name.into(),
        }
    }

    /// Returns the `(node, device)` pair this event concerns, if any.
    #[must_use]
    pub fn device_key(&self) -> Option<(&str, &str)> {
        match self {
            Self::DeviceUpdated {
                node_id,
                device_name,
            }
            | Self::DeviceReverted {
                node_id,
                device_name,
            } => Some((node_id, device_name)),
            Self::Replaced { .. } | Self::UpdateFailed { .. } => None,
        }
    }
}
