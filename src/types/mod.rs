// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for hub state and commands.
//!
//! Each type keeps its value in range at construction time, so records and
//! command payloads never carry out-of-range numbers.
//!
//! # Types
//!
//! - [`BrightnessPct`] - LED brightness as the vendor reports it (0-100%)
//! - [`LedBrightness`] - LED brightness on the host scale (0-255)
//! - [`Hue`] - LED hue in degrees (0-360)
//! - [`RgbColor`] - LED colour as shown to hosts
//! - [`SystemStatus`] - User-facing operating status
//! - [`Runtime`] - Cumulative runtime in minutes

mod brightness;
mod color;
mod runtime;
mod status;

pub use brightness::{BrightnessPct, LedBrightness};
pub use color::{Hue, RgbColor};
pub use runtime::Runtime;
pub use status::SystemStatus;
