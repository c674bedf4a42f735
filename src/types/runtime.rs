// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub runtime counter.
//!
//! The hub reports `System Runtime` as whole minutes. [`Runtime`] wraps that
//! counter and renders it the way users read it.
//!
//! # Examples
//!
//! ```
//! use livhub_lib::types::Runtime;
//!
//! let runtime = Runtime::from_minutes(715);
//! assert_eq!(runtime.to_string(), "11 hours, 55 minutes");
//! assert_eq!(Runtime::from_minutes(0).to_string(), "0 minutes");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// Cumulative hub runtime in minutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Runtime(u64);

impl Runtime {
    /// Creates a runtime from a minute count.
    #[must_use]
    pub const fn from_minutes(minutes: u64) -> Self {
        Self(minutes)
    }

    /// Returns the total minutes.
    #[must_use]
    pub const fn minutes(&self) -> u64 {
        self.0
    }

    /// Returns whole days.
    #[must_use]
    pub const fn days(&self) -> u64 {
        self.0 / MINUTES_PER_DAY
    }

    /// Returns the hours left over after whole days.
    #[must_use]
    pub const fn hours(&self) -> u64 {
        (self.0 % MINUTES_PER_DAY) / MINUTES_PER_HOUR
    }

    /// Returns the minutes left over after whole hours.
    #[must_use]
    pub const fn remaining_minutes(&self) -> u64 {
        self.0 % MINUTES_PER_HOUR
    }

    /// Total runtime in hours, rounded to one decimal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_hours(&self) -> f64 {
        (self.0 as f64 / MINUTES_PER_HOUR as f64 * 10.0).round() / 10.0
    }

    /// Total runtime in days, rounded to two decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_days(&self) -> f64 {
        (self.0 as f64 / MINUTES_PER_DAY as f64 * 100.0).round() / 100.0
    }

    /// Converts to a [`Duration`], saturating at `u64::MAX` seconds.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.saturating_mul(60))
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.days(), "day"),
            (self.hours(), "hour"),
            (self.remaining_minutes(), "minute"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| {
            let plural = if count == 1 { "" } else { "s" };
            format!("{count} {unit}{plural}")
        })
        .collect();

        if parts.is_empty() {
            f.write_str("0 minutes")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
