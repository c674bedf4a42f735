// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED brightness on the two scales the bridge speaks.
//!
//! The vendor cloud stores brightness as a percentage (0-100) while hosts
//! expect the 0-255 scale. Conversions round to the nearest integer with
//! ties away from zero (`f64::round`), so a value converted one way and
//! back again lands within one unit of where it started.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness as the vendor reports it: a percentage (0-100).
///
/// # Examples
///
/// ```
/// use livhub_lib::types::BrightnessPct;
///
/// let pct = BrightnessPct::new(56).unwrap();
/// assert_eq!(pct.value(), 56);
/// assert_eq!(pct.to_host().value(), 143);
///
/// assert!(BrightnessPct::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct BrightnessPct(u8);

impl BrightnessPct {
    /// Fully off.
    pub const MIN: Self = Self(0);

    /// Full brightness.
    pub const MAX: Self = Self(100);

    /// Creates a percentage, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a percentage, clamping to the valid range.
    ///
    /// Vendor payloads occasionally carry out-of-range numbers; the
    /// normalizer uses this rather than failing the whole node.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Safe: clamped to 0..=100 first
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, 100) as u8;
        Self(value)
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the value as a fraction between 0.0 and 1.0.
    #[must_use]
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Creates a percentage from a fraction, rounding to the nearest point.
    ///
    /// Fractions outside [0.0, 1.0] are clamped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_fraction(fraction: f64) -> Self {
        Self((fraction.clamp(0.0, 1.0) * 100.0).round() as u8)
    }

    /// Converts to the host 0-255 scale.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_host(&self) -> LedBrightness {
        LedBrightness((self.as_fraction() * 255.0).round() as u8)
    }

    /// Returns `true` if the LED is dark at this level.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BrightnessPct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for BrightnessPct {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BrightnessPct> for u8 {
    fn from(pct: BrightnessPct) -> Self {
        pct.0
    }
}

/// Brightness on the host scale (0-255).
///
/// # Examples
///
/// ```
/// use livhub_lib::types::LedBrightness;
///
/// let level = LedBrightness::new(143);
/// assert_eq!(level.to_percent().value(), 56);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LedBrightness(u8);

impl LedBrightness {
    /// Fully off.
    pub const OFF: Self = Self(0);

    /// Full brightness.
    pub const FULL: Self = Self(255);

    /// Creates a host-scale brightness.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw 0-255 value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Converts to the vendor percentage scale.
    #[must_use]
    pub fn to_percent(&self) -> BrightnessPct {
        BrightnessPct::from_fraction(f64::from(self.0) / 255.0)
    }

    /// Returns `true` if the LED is dark at this level.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for LedBrightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for LedBrightness {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
