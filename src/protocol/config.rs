// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection settings for the vendor cloud.

use std::fmt;
use std::time::Duration;

use reqwest::Client;

use crate::auth::CredentialManager;
use crate::error::RequestError;

use super::{RainmakerClient, Transport};

/// Configuration for the vendor cloud API.
///
/// Username, password and base URL are the only inputs the bridge needs;
/// timeout and retry count default to the values the hub app uses.
///
/// # Examples
///
/// ```
/// use livhub_lib::protocol::ApiConfig;
/// use std::time::Duration;
///
/// let config = ApiConfig::new("user@example.com", "password")
///     .with_base_url("https://api.example.com/")
///     .with_timeout(Duration::from_secs(10))
///     .with_retry_attempts(2);
///
/// assert_eq!(config.api_root(), "https://api.example.com/v1");
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    username: String,
    password: String,
    base_url: String,
    timeout: Duration,
    retry_attempts: u32,
}

impl ApiConfig {
    /// Default vendor endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.iot.thermacell.com/";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default number of attempts for a timed-out request.
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    /// API version prefix appended to the base URL.
    pub const API_VERSION: &'static str = "v1";

    /// Creates a configuration for the given account.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry_attempts: Self::DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many attempts a timed-out request gets in total.
    ///
    /// Values below 1 are raised to 1.
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the base URL as configured.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the total number of attempts for a timed-out request.
    #[must_use]
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Returns the versioned API root without a trailing slash.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            Self::API_VERSION
        )
    }

    /// Builds the authenticated transport.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not HTTP(S) or the HTTP client
    /// cannot be created.
    pub fn into_transport(self) -> Result<Transport, RequestError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(RequestError::InvalidUrl(self.base_url));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(RequestError::Http)?;

        let api_root = self.api_root();
        let auth = CredentialManager::new(client.clone(), &api_root, self.username, self.password);

        Ok(Transport::new(client, api_root, auth, self.retry_attempts))
    }

    /// Builds the endpoint client.
    ///
    /// # Errors
    ///
    /// See [`into_transport`](Self::into_transport).
    pub fn into_client(self) -> Result<RainmakerClient, RequestError> {
        self.into_transport().map(RainmakerClient::new)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}
