// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator settings.

use std::time::Duration;

use crate::event::DEFAULT_CHANNEL_CAPACITY;

/// When a command's optimistic patch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandPolicy {
    /// Patch the store only after the cloud accepted the write.
    ///
    /// A failed command never touches the store.
    #[default]
    ApplyAfterConfirm,

    /// Patch the store before the write and revert the patch if the write
    /// fails.
    Speculative,
}

/// Configuration for the [`Coordinator`](super::Coordinator).
///
/// # Examples
///
/// ```
/// use livhub_lib::coordinator::{CommandPolicy, CoordinatorConfig};
/// use std::time::Duration;
///
/// let config = CoordinatorConfig::new()
///     .with_poll_interval(Duration::from_secs(30))
///     .with_command_policy(CommandPolicy::Speculative)
///     .with_refresh_after_command(false);
///
/// assert_eq!(config.poll_interval(), Duration::from_secs(30));
/// assert!(!config.refresh_after_command());
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    poll_interval: Duration,
    refresh_after_command: bool,
    command_policy: CommandPolicy,
    event_capacity: usize,
}

impl CoordinatorConfig {
    /// Default time between polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Shortest accepted poll interval.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            refresh_after_command: true,
            command_policy: CommandPolicy::default(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the time between polls, at least one second.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Self::MIN_POLL_INTERVAL);
        self
    }

    /// Sets whether a successful command requests a poll.
    #[must_use]
    pub fn with_refresh_after_command(mut self, enabled: bool) -> Self {
        self.refresh_after_command = enabled;
        self
    }

    /// Sets the command policy.
    #[must_use]
    pub fn with_command_policy(mut self, policy: CommandPolicy) -> Self {
        self.command_policy = policy;
        self
    }

    /// Sets how many store events are buffered per subscriber.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Returns the time between polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns whether a successful command requests a poll.
    #[must_use]
    pub fn refresh_after_command(&self) -> bool {
        self.refresh_after_command
    }

    /// Returns the command policy.
    #[must_use]
    pub fn command_policy(&self) -> CommandPolicy {
        self.command_policy
    }

    /// Returns the event buffer size.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
