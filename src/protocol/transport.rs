// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated HTTP transport.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value};

use crate::auth::{CredentialManager, Credentials};
use crate::error::{AuthError, RequestError};

/// Performs authenticated JSON requests against the vendor API.
///
/// - The access token goes into the `Authorization` header as-is; the
///   vendor does not use a `Bearer` prefix.
/// - A 401 triggers one re-authentication and one retry of the request.
/// - A timed-out request is retried immediately, up to the configured
///   number of attempts in total.
/// - Any other non-2xx status is returned as [`RequestError::Status`].
#[derive(Debug)]
pub struct Transport {
    client: Client,
    api_root: String,
    auth: CredentialManager,
    max_attempts: u32,
}

/// What one round trip produced.
enum Exchange {
    Reply { status: StatusCode, body: String },
    TimedOut,
}

impl Transport {
    /// Creates a transport.
    ///
    /// Prefer [`ApiConfig::into_transport`](super::ApiConfig::into_transport).
    #[must_use]
    pub fn new(
        client: Client,
        api_root: impl Into<String>,
        auth: CredentialManager,
        max_attempts: u32,
    ) -> Self {
        Self {
            client,
            api_root: api_root.into(),
            auth,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the versioned API root.
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Returns the credential manager.
    #[must_use]
    pub fn auth(&self) -> &CredentialManager {
        &self.auth
    }

    /// Sends a request and returns the decoded JSON body.
    ///
    /// `path` is relative to the API root and may carry a query string.
    /// Empty or non-JSON success bodies decode to an empty object.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Auth`] if no credential can be obtained
    /// - [`RequestError::Timeout`] once every attempt has timed out
    /// - [`RequestError::Status`] for any other non-2xx answer
    /// - [`RequestError::Http`] for connection-level failures
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, RequestError> {
        let url = format!("{}{path}", self.api_root);
        let mut credentials = self.auth.credentials().await?;
        let mut reauthenticated = false;
        let mut timeouts = 0;

        loop {
            tracing::debug!(%method, url = %url, "Sending API request");

            let (status, text) = match self
                .exchange(method.clone(), &url, body, &credentials)
                .await?
            {
                Exchange::Reply { status, body } => (status, body),
                Exchange::TimedOut => {
                    timeouts += 1;
                    tracing::warn!(
                        attempt = timeouts,
                        max_attempts = self.max_attempts,
                        "API request timeout"
                    );
                    if timeouts >= self.max_attempts {
                        return Err(RequestError::Timeout { attempts: timeouts });
                    }
                    continue;
                }
            };

            if status == StatusCode::UNAUTHORIZED && !reauthenticated {
                tracing::info!("Access token rejected, re-authenticating");
                reauthenticated = true;
                credentials = self.reauthenticate(&credentials).await?;
                continue;
            }

            if !status.is_success() {
                tracing::error!(status = status.as_u16(), body = %text, "API request failed");
                return Err(RequestError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            tracing::debug!(status = status.as_u16(), body = %text, "Received API response");
            return Ok(decode_body(&text));
        }
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, path: &str) -> Result<Value, RequestError> {
        self.request(Method::GET, path, None).await
    }

    /// Sends a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, RequestError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn reauthenticate(&self, stale: &Credentials) -> Result<Credentials, AuthError> {
        self.auth.reauthenticate(stale).await
    }

    async fn exchange(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        credentials: &Credentials,
    ) -> Result<Exchange, RequestError> {
        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, credentials.access_token());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(Exchange::TimedOut),
            Err(e) => return Err(RequestError::Http(e)),
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => Ok(Exchange::Reply { status, body }),
            Err(e) if e.is_timeout() => Ok(Exchange::TimedOut),
            Err(e) => Err(RequestError::Http(e)),
        }
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Response body is not JSON");
        Value::Object(Map::new())
    })
}
