// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical records and the store that holds them.
//!
//! - [`DeviceRecord`]: the state of one device, with its derived fields
//!   kept consistent
//! - [`NodeRecord`]: one hub, its metadata and its devices
//! - [`StateStore`]: the last-known records of every node, updated
//!   wholesale by polls and per device by commands
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use livhub_lib::state::{DeviceRecord, NodeRecord, StateStore};
//!
//! let store = StateStore::new();
//! store.replace_all([
//!     NodeRecord::new("n1", "Patio", true, Utc::now()).with_device(DeviceRecord::new("LIV Hub")),
//!     NodeRecord::new("n2", "Deck", false, Utc::now()).with_device(DeviceRecord::new("LIV Hub")),
//! ]);
//!
//! assert!(store.is_online("n1"));
//! assert!(!store.is_online("n2"));
//! assert!(!store.is_online("n3"));
//! ```

mod device_record;
mod node_record;
mod store;

pub use device_record::DeviceRecord;
pub use node_record::{NodeRecord, UNKNOWN};
pub use store::StateStore;
