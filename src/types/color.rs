// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED colour types and the hue/value conversions used by the hub.
//!
//! The hub stores its LED colour as a hue (0-360) plus a brightness
//! percentage; saturation is always full. [`RgbColor::from_hue_value`] and
//! [`RgbColor::to_hue_value`] are the two directions of that mapping and
//! must stay exact inverses for saturated colours.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::BrightnessPct;

/// Hue angle in degrees (0-360).
///
/// # Examples
///
/// ```
/// use livhub_lib::types::Hue;
///
/// let hue = Hue::new(120).unwrap();
/// assert_eq!(hue.value(), 120);
/// assert!(Hue::new(361).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct Hue(u16);

impl Hue {
    /// Maximum hue value.
    pub const MAX: u16 = 360;

    /// Creates a hue, rejecting values above 360.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHue` if value exceeds 360.
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if value > Self::MAX {
            return Err(ValueError::InvalidHue(value));
        }
        Ok(Self(value))
    }

    /// Creates a hue, wrapping any angle into 0-359.
    #[must_use]
    pub fn wrapped(value: i64) -> Self {
        // Safe: rem_euclid keeps the value in 0..360
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.rem_euclid(360) as u16;
        Self(value)
    }

    /// Returns the hue in degrees.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Hue {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hue> for u16 {
    fn from(hue: Hue) -> Self {
        hue.0
    }
}

/// RGB color with 8-bit channels (0-255).
///
/// Serializes as `{"r": .., "g": .., "b": ..}`, the shape hosts read from
/// the state table.
///
/// # Examples
///
/// ```
/// use livhub_lib::types::{BrightnessPct, Hue, RgbColor};
///
/// let red = RgbColor::from_hue_value(Hue::new(0).unwrap(), BrightnessPct::MAX);
/// assert_eq!(red, RgbColor::new(255, 0, 0));
///
/// let (hue, value) = RgbColor::new(0, 255, 0).to_hue_value();
/// assert_eq!(hue.value(), 120);
/// assert_eq!(value.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    #[serde(rename = "r")]
    red: u8,
    #[serde(rename = "g")]
    green: u8,
    #[serde(rename = "b")]
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Creates a black color.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the color as a hex string with the hash prefix.
    #[must_use]
    pub fn to_hex_with_hash(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    /// Builds the colour the hub shows for a hue and brightness.
    ///
    /// Saturation is fixed at 1.0 and the brightness percentage is the HSV
    /// value, so a brightness of 0 always yields black.
    #[must_use]
    pub fn from_hue_value(hue: Hue, value: BrightnessPct) -> Self {
        let (r, g, b) = hsv_to_rgb(f64::from(hue.value() % 360), 1.0, value.as_fraction());
        Self::new(r, g, b)
    }

    /// Splits this colour into the hue and brightness the hub accepts.
    ///
    /// Saturation is dropped; unsaturated colours come back from the hub as
    /// the fully saturated colour of the same hue and value.
    #[must_use]
    pub fn to_hue_value(&self) -> (Hue, BrightnessPct) {
        let (h, _s, v) = rgb_to_hsv(self.red, self.green, self.blue);
        #[allow(clippy::cast_possible_truncation)]
        let hue = Hue::wrapped(h.round() as i64);
        (hue, BrightnessPct::from_fraction(v))
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_with_hash())
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

/// Converts RGB values to HSV.
///
/// Returns (hue: 0-360 degrees, saturation: 0-1, value: 0-1)
#[allow(clippy::many_single_char_names)]
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    let hue = if delta < f64::EPSILON {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        (60.0 * ((g - b) / delta)).rem_euclid(360.0)
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    (hue, saturation, max)
}

/// Converts HSV values to RGB.
///
/// Takes (hue: 0-360 degrees, saturation: 0-1, value: 0-1)
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
