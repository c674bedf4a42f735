// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LivHub` Lib - A Rust library to bridge Thermacell LIV hubs from the
//! vendor cloud into a home automation host.
//!
//! The library logs in to the vendor's ESP Rainmaker cloud, polls every
//! hub on the account, normalizes the vendor's parameter names into stable
//! records, and issues commands with optimistic local updates.
//!
//! # Supported Features
//!
//! - **State**: hub power, LED colour and brightness, refill life, operating
//!   status, error code, runtime, firmware, connectivity
//! - **Commands**: hub power, LED power, LED colour, LED brightness, refill
//!   reset
//! - **Polling**: fixed interval plus on-demand refreshes that coalesce
//! - **Events**: broadcast notifications on every store change
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use livhub_lib::coordinator::{Coordinator, CoordinatorConfig, PollScheduler};
//! use livhub_lib::protocol::ApiConfig;
//! use livhub_lib::types::RgbColor;
//!
//! #[tokio::main]
//! async fn main() -> livhub_lib::Result<()> {
//!     let api = ApiConfig::new("user@example.com", "password");
//!     let coordinator = Arc::new(Coordinator::connect(api, CoordinatorConfig::default())?);
//!
//!     // Initial state, then keep it fresh in the background
//!     coordinator.refresh().await?;
//!     let _poller = PollScheduler::start(Arc::clone(&coordinator));
//!
//!     for node in coordinator.store().nodes() {
//!         println!("{} ({}) online={}", node.name(), node.model(), node.online());
//!         for device in node.devices() {
//!             println!("  {}: {}", device.name(), device.system_status());
//!             coordinator
//!                 .set_device_led_color(node.id(), device.name(), RgbColor::new(0, 255, 0))
//!                 .await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Watching for Changes
//!
//! ```no_run
//! use livhub_lib::coordinator::{Coordinator, CoordinatorConfig};
//! use livhub_lib::event::StoreEvent;
//! use livhub_lib::protocol::ApiConfig;
//!
//! # async fn example() -> livhub_lib::Result<()> {
//! let api = ApiConfig::new("user@example.com", "password");
//! let coordinator = Coordinator::connect(api, CoordinatorConfig::default())?;
//! let mut events = coordinator.subscribe();
//!
//! while let Ok(event) = events.recv().await {
//!     if let StoreEvent::UpdateFailed { reason } = event {
//!         eprintln!("poll failed: {reason}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod normalize;
pub mod protocol;
pub mod state;
pub mod types;

pub use coordinator::{CommandPolicy, Coordinator, CoordinatorConfig, PollHandle, PollScheduler};
pub use error::{AuthError, Error, ParseError, RequestError, Result, UpdateFailed, ValueError};
pub use event::{EventBus, StoreEvent};
pub use protocol::{ApiConfig, CloudApi, RainmakerClient};
pub use state::{DeviceRecord, NodeRecord, StateStore};
pub use types::{BrightnessPct, Hue, LedBrightness, RgbColor, Runtime, SystemStatus};
