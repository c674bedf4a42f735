// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device commands.
//!
//! Each command writes one device's parameters to the cloud and patches
//! that device in the store. Commands addressed to a device the store does
//! not know are still sent; the store is left alone.

use serde_json::{Map, Value, json};

use crate::normalize::payload::HubParams;
use crate::protocol::CloudApi;
use crate::state::DeviceRecord;
use crate::types::{BrightnessPct, LedBrightness, RgbColor};

use super::{CommandPolicy, Coordinator};

impl<A: CloudApi> Coordinator<A> {
    /// Enables or disables the hub's repellers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::Error::Request) if the cloud
    /// rejects the write.
    pub async fn set_device_power(
        &self,
        node_id: &str,
        device_name: &str,
        on: bool,
    ) -> crate::Result<()> {
        let mut fields = Map::new();
        fields.insert(HubParams::ENABLE_REPELLERS.to_string(), json!(on));

        self.execute(node_id, device_name, fields, move |device| {
            device.set_power(on);
        })
        .await
    }

    /// Turns the LED on or off.
    ///
    /// Off sets the brightness to 0. On restores the current brightness,
    /// or full brightness if it is 0. Hub power is not changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::Error::Request) if the cloud
    /// rejects the write.
    pub async fn set_device_led_power(
        &self,
        node_id: &str,
        device_name: &str,
        on: bool,
    ) -> crate::Result<()> {
        let pct = if on {
            self.store
                .device(node_id, device_name)
                .map(|device| device.led_brightness_pct())
                .filter(|pct| !pct.is_off())
                .unwrap_or(BrightnessPct::MAX)
        } else {
            BrightnessPct::MIN
        };

        let mut fields = Map::new();
        fields.insert(HubParams::LED_BRIGHTNESS.to_string(), json!(pct.value()));

        self.execute(node_id, device_name, fields, move |device| {
            device.set_led_brightness_pct(pct);
        })
        .await
    }

    /// Sets the LED colour.
    ///
    /// The hub takes a hue and a brightness; saturation is dropped, so the
    /// store holds the fully saturated colour the hub will report back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::Error::Request) if the cloud
    /// rejects the write.
    pub async fn set_device_led_color(
        &self,
        node_id: &str,
        device_name: &str,
        color: RgbColor,
    ) -> crate::Result<()> {
        let (hue, pct) = color.to_hue_value();

        let mut fields = Map::new();
        fields.insert(HubParams::LED_HUE.to_string(), json!(hue.value()));
        fields.insert(HubParams::LED_BRIGHTNESS.to_string(), json!(pct.value()));

        self.execute(node_id, device_name, fields, move |device| {
            device.set_led_color(hue, pct);
        })
        .await
    }

    /// Sets the LED brightness on the host scale.
    ///
    /// The cloud receives the equivalent percentage; the store keeps the
    /// requested value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::Error::Request) if the cloud
    /// rejects the write.
    pub async fn set_device_led_brightness(
        &self,
        node_id: &str,
        device_name: &str,
        level: LedBrightness,
    ) -> crate::Result<()> {
        let pct = level.to_percent();

        let mut fields = Map::new();
        fields.insert(HubParams::LED_BRIGHTNESS.to_string(), json!(pct.value()));

        self.execute(node_id, device_name, fields, move |device| {
            device.set_led_brightness(level);
        })
        .await
    }

    /// Resets the refill counter after a cartridge change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::Error::Request) if the cloud
    /// rejects the write.
    pub async fn reset_refill_life(&self, node_id: &str, device_name: &str) -> crate::Result<()> {
        let mut fields = Map::new();
        fields.insert(HubParams::REFILL_RESET.to_string(), json!(1));

        self.execute(node_id, device_name, fields, |device| {
            device.set_refill_life(100.0);
        })
        .await
    }

    async fn execute<F>(
        &self,
        node_id: &str,
        device_name: &str,
        fields: Map<String, Value>,
        patch: F,
    ) -> crate::Result<()>
    where
        F: FnOnce(&mut DeviceRecord) + Send,
    {
        let mut params = Map::new();
        params.insert(device_name.to_string(), Value::Object(fields));
        let params = Value::Object(params);

        tracing::debug!(node_id, device = device_name, params = %params, "Sending command");

        match self.config.command_policy() {
            CommandPolicy::ApplyAfterConfirm => {
                if let Err(err) = self.api.set_node_params(node_id, params).await {
                    tracing::warn!(node_id, device = device_name, error = %err, "Command failed");
                    return Err(err.into());
                }
                if self
                    .store
                    .apply_optimistic(node_id, device_name, patch)
                    .is_none()
                {
                    tracing::debug!(node_id, device = device_name, "Device not in store");
                }
            }
            CommandPolicy::Speculative => {
                let previous = self.store.apply_optimistic(node_id, device_name, patch);
                if let Err(err) = self.api.set_node_params(node_id, params).await {
                    tracing::warn!(node_id, device = device_name, error = %err, "Command failed");
                    if let Some(previous) = previous {
                        self.store.revert(node_id, device_name, previous);
                    }
                    return Err(err.into());
                }
            }
        }

        if self.config.refresh_after_command() {
            self.request_refresh();
        }
        Ok(())
    }
}
