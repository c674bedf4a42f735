// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications for state store consumers.
//!
//! The [`StateStore`](crate::state::StateStore) publishes a [`StoreEvent`]
//! on every commit, optimistic patch, revert and failed poll. Events are
//! published after the store lock is released, so a subscriber may read the
//! store from its handler.
//!
//! # Examples
//!
//! ```
//! use livhub_lib::event::{EventBus, StoreEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(StoreEvent::device_updated("node-1", "LIV Hub"));
//! ```

mod event_bus;
mod store_event;

pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use store_event::StoreEvent;
