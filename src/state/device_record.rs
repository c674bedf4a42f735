// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical state of one device.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{BrightnessPct, Hue, LedBrightness, RgbColor, SystemStatus};

/// Canonical state of one device within a node.
///
/// Fields are private so their relationships hold after every mutation:
///
/// - `led_brightness`, `led_brightness_pct`, `led_hue` and `led_color` are
///   always changed together
/// - `system_status` is re-derived by [`refresh_status`](Self::refresh_status)
/// - LED power is not stored at all; [`led_power`](Self::led_power) computes
///   it from power and brightness
///
/// # Examples
///
/// ```
/// use livhub_lib::state::DeviceRecord;
/// use livhub_lib::types::{BrightnessPct, Hue, SystemStatus};
///
/// let mut device = DeviceRecord::new("LIV Hub");
/// device.set_power(true);
/// device.set_led_color(Hue::new(120).unwrap(), BrightnessPct::new(100).unwrap());
/// device.refresh_status(true);
///
/// assert!(device.led_power());
/// assert_eq!(device.led_color().to_hex_with_hash(), "#00FF00");
/// assert_eq!(device.system_status(), SystemStatus::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredDevice")]
pub struct DeviceRecord {
    name: String,
    power: bool,
    led_brightness: LedBrightness,
    led_brightness_pct: BrightnessPct,
    led_hue: Hue,
    led_color: RgbColor,
    refill_life: f64,
    system_status: SystemStatus,
    system_status_code: i64,
    error_code: i64,
    last_updated: i64,
}

/// Serialized form of a [`DeviceRecord`].
///
/// `led_color` is not read back; it and `system_status` are re-derived on
/// load. The stored host brightness is kept only if it maps to the stored
/// percentage.
#[derive(Deserialize)]
struct StoredDevice {
    name: String,
    power: bool,
    led_brightness: LedBrightness,
    led_brightness_pct: BrightnessPct,
    led_hue: Hue,
    refill_life: f64,
    system_status: SystemStatus,
    system_status_code: i64,
    error_code: i64,
    last_updated: i64,
}

impl From<StoredDevice> for DeviceRecord {
    fn from(stored: StoredDevice) -> Self {
        let mut device = Self::new(stored.name);
        device.set_power(stored.power);
        device.led_hue = stored.led_hue;
        if stored.led_brightness.to_percent() == stored.led_brightness_pct {
            device.set_led_brightness(stored.led_brightness);
        } else {
            device.set_led_brightness_pct(stored.led_brightness_pct);
        }
        device.set_refill_life(stored.refill_life);
        device.set_codes(stored.system_status_code, stored.error_code);
        device.set_last_updated(stored.last_updated);
        device.refresh_status(stored.system_status != SystemStatus::NotConnected);
        device
    }
}

impl DeviceRecord {
    /// Creates a powered-off record with the LED dark.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            power: false,
            led_brightness: LedBrightness::OFF,
            led_brightness_pct: BrightnessPct::MIN,
            led_hue: Hue::default(),
            led_color: RgbColor::black(),
            refill_life: 0.0,
            system_status: SystemStatus::Unknown,
            system_status_code: 0,
            error_code: 0,
            last_updated: 0,
        }
    }

    /// Returns the device name, as the vendor keys it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the hub is enabled.
    #[must_use]
    pub fn power(&self) -> bool {
        self.power
    }

    /// Returns whether the LED is lit.
    ///
    /// Always `power && led_brightness > 0`.
    #[must_use]
    pub fn led_power(&self) -> bool {
        self.power && !self.led_brightness.is_off()
    }

    /// Returns the LED brightness on the host scale.
    #[must_use]
    pub fn led_brightness(&self) -> LedBrightness {
        self.led_brightness
    }

    /// Returns the LED brightness on the vendor scale.
    #[must_use]
    pub fn led_brightness_pct(&self) -> BrightnessPct {
        self.led_brightness_pct
    }

    /// Returns the LED hue.
    #[must_use]
    pub fn led_hue(&self) -> Hue {
        self.led_hue
    }

    /// Returns the LED colour.
    #[must_use]
    pub fn led_color(&self) -> RgbColor {
        self.led_color
    }

    /// Returns the remaining refill life in percent.
    #[must_use]
    pub fn refill_life(&self) -> f64 {
        self.refill_life
    }

    /// Returns the derived operating status.
    #[must_use]
    pub fn system_status(&self) -> SystemStatus {
        self.system_status
    }

    /// Returns the raw vendor status code.
    #[must_use]
    pub fn system_status_code(&self) -> i64 {
        self.system_status_code
    }

    /// Returns the raw vendor error code.
    #[must_use]
    pub fn error_code(&self) -> i64 {
        self.error_code
    }

    /// Returns when the device last reported, in epoch seconds.
    #[must_use]
    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    /// Sets whether the hub is enabled.
    ///
    /// Call [`refresh_status`](Self::refresh_status) afterwards.
    pub fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    /// Sets the LED hue and brightness as the vendor reports them.
    pub fn set_led_color(&mut self, hue: Hue, pct: BrightnessPct) {
        self.led_hue = hue;
        self.set_led_brightness_pct(pct);
    }

    /// Sets the LED brightness on the vendor scale.
    ///
    /// The host value is derived from it.
    pub fn set_led_brightness_pct(&mut self, pct: BrightnessPct) {
        self.led_brightness_pct = pct;
        self.led_brightness = pct.to_host();
        self.led_color = RgbColor::from_hue_value(self.led_hue, pct);
    }

    /// Sets the LED brightness on the host scale.
    ///
    /// The host value is kept as given; the vendor value is derived.
    pub fn set_led_brightness(&mut self, level: LedBrightness) {
        self.led_brightness = level;
        self.led_brightness_pct = level.to_percent();
        self.led_color = RgbColor::from_hue_value(self.led_hue, self.led_brightness_pct);
    }

    /// Sets the remaining refill life, clamped to 0-100.
    pub fn set_refill_life(&mut self, percent: f64) {
        self.refill_life = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
    }

    /// Sets the raw vendor status and error codes.
    ///
    /// Call [`refresh_status`](Self::refresh_status) afterwards.
    pub fn set_codes(&mut self, system_status_code: i64, error_code: i64) {
        self.system_status_code = system_status_code;
        self.error_code = error_code;
    }

    /// Sets when the device last reported, in epoch seconds.
    pub fn set_last_updated(&mut self, epoch_seconds: i64) {
        self.last_updated = epoch_seconds;
    }

    /// Re-derives the operating status from the stored codes.
    pub fn refresh_status(&mut self, online: bool) {
        self.system_status =
            SystemStatus::derive(self.error_code, self.power, self.system_status_code, online);
    }

    /// Returns every field as a `(name, value)` pair for host display.
    ///
    /// Includes the derived `led_power`.
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("power", json!(self.power)),
            ("led_power", json!(self.led_power())),
            ("led_brightness", json!(self.led_brightness.value())),
            ("led_brightness_pct", json!(self.led_brightness_pct.value())),
            ("led_hue", json!(self.led_hue.value())),
            ("led_color", json!(self.led_color)),
            ("refill_life", json!(self.refill_life)),
            ("system_status", json!(self.system_status.as_str())),
            ("system_status_code", json!(self.system_status_code)),
            ("error_code", json!(self.error_code)),
            ("last_updated", json!(self.last_updated)),
        ]
    }
}
