// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub system status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating status of a hub, as shown to users.
///
/// Derived from the vendor's raw status code, enable flag, error code and
/// the node's connectivity. See [`SystemStatus::derive`] for precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SystemStatus {
    /// Repellers disabled or idle.
    Off,
    /// Heating up the repellent mat.
    #[serde(rename = "Warming Up")]
    WarmingUp,
    /// Actively protecting.
    Protected,
    /// The hub reports a non-zero error code.
    Error,
    /// The node is not connected to the cloud.
    #[serde(rename = "Not Connected")]
    NotConnected,
    /// Unrecognized status code.
    #[default]
    Unknown,
}

impl SystemStatus {
    /// Raw status code for "off".
    pub const CODE_OFF: i64 = 1;
    /// Raw status code for "warming up".
    pub const CODE_WARMING_UP: i64 = 2;
    /// Raw status code for "protected".
    pub const CODE_PROTECTED: i64 = 3;

    /// Derives the user-facing status.
    ///
    /// Precedence: a positive error code wins, then a disabled hub reads
    /// "Off", then the raw status code decides. A disconnected node reads
    /// "Not Connected" regardless of everything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use livhub_lib::types::SystemStatus;
    ///
    /// assert_eq!(SystemStatus::derive(5, true, 3, true), SystemStatus::Error);
    /// assert_eq!(SystemStatus::derive(0, false, 3, true), SystemStatus::Off);
    /// assert_eq!(SystemStatus::derive(5, true, 3, false), SystemStatus::NotConnected);
    /// ```
    #[must_use]
    pub fn derive(error_code: i64, enabled: bool, status_code: i64, online: bool) -> Self {
        if !online {
            return Self::NotConnected;
        }
        if error_code > 0 {
            return Self::Error;
        }
        if !enabled {
            return Self::Off;
        }
        match status_code {
            Self::CODE_OFF => Self::Off,
            Self::CODE_WARMING_UP => Self::WarmingUp,
            Self::CODE_PROTECTED => Self::Protected,
            _ => Self::Unknown,
        }
    }

    /// Returns the display text for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::WarmingUp => "Warming Up",
            Self::Protected => "Protected",
            Self::Error => "Error",
            Self::NotConnected => "Not Connected",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
