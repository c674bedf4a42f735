// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Credential management for the vendor cloud.
//!
//! [`CredentialManager`] owns the account's username and password and the
//! current [`Credentials`]. Logins are single-flight: while one login is on
//! the wire, every other caller that asks for a login waits for it and
//! receives the same outcome instead of starting its own.

mod token;

pub use token::{USER_ID_CLAIM, decode_claims, user_id_from_id_token};

#[cfg(test)]
pub(crate) use token::encode_test_token;

use std::fmt;

use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AuthError;

/// An authenticated session with the vendor cloud.
///
/// Credentials are replaced as a whole on every login and never patched.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    user_id: String,
    refresh_token: Option<String>,
}

impl Credentials {
    /// Creates credentials from their parts.
    #[must_use]
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: user_id.into(),
            refresh_token: None,
        }
    }

    /// Attaches a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns the access token, sent verbatim as the `Authorization` header.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the vendor user id decoded from the identity token.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the refresh token, if the login response carried one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accesstoken")]
    access_token: Option<String>,
    #[serde(rename = "idtoken")]
    id_token: Option<String>,
    #[serde(rename = "refreshtoken")]
    refresh_token: Option<String>,
}

#[derive(Debug, Default)]
struct AuthState {
    credentials: Option<Credentials>,
    /// Number of completed login attempts.
    attempts: u64,
    last_failure: Option<AuthError>,
}

impl AuthState {
    fn last_outcome(&self) -> Result<Credentials, AuthError> {
        match (&self.credentials, &self.last_failure) {
            (Some(credentials), _) => Ok(credentials.clone()),
            (None, Some(err)) => Err(err.clone()),
            (None, None) => Err(AuthError::MissingField("accesstoken")),
        }
    }
}

/// Holds the account credentials and performs logins.
pub struct CredentialManager {
    client: Client,
    login_url: String,
    username: String,
    password: String,
    state: RwLock<AuthState>,
    login_lock: Mutex<()>,
}

impl CredentialManager {
    /// Login endpoint, relative to the API version prefix.
    pub const LOGIN_PATH: &'static str = "/login2";

    /// Creates a manager that logs in at `{api_root}/login2`.
    ///
    /// `api_root` is the versioned API root, e.g. `https://host/v1`.
    #[must_use]
    pub fn new(
        client: Client,
        api_root: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            login_url: format!("{api_root}{}", Self::LOGIN_PATH),
            username: username.into(),
            password: password.into(),
            state: RwLock::new(AuthState::default()),
            login_lock: Mutex::new(()),
        }
    }

    /// Returns the current credentials without logging in.
    #[must_use]
    pub fn current(&self) -> Option<Credentials> {
        self.state.read().credentials.clone()
    }

    /// Returns the current credentials, logging in first if there are none.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if a login was needed and failed.
    pub async fn credentials(&self) -> Result<Credentials, AuthError> {
        let seen = {
            let state = self.state.read();
            if let Some(credentials) = &state.credentials {
                return Ok(credentials.clone());
            }
            state.attempts
        };
        self.login_once(seen, None).await
    }

    /// Logs in with the configured username and password.
    ///
    /// If a login is already in flight, waits for it and returns its
    /// outcome rather than logging in again.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on network failure, a non-200 response, or a
    /// response without the required tokens.
    pub async fn authenticate(&self) -> Result<Credentials, AuthError> {
        let seen = self.state.read().attempts;
        self.login_once(seen, None).await
    }

    /// Replaces credentials the server just rejected.
    ///
    /// If another caller already replaced `stale` (or a login finished while
    /// this caller waited), the newer outcome is returned without a second
    /// login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the login fails.
    pub async fn reauthenticate(&self, stale: &Credentials) -> Result<Credentials, AuthError> {
        let seen = self.state.read().attempts;
        self.login_once(seen, Some(stale)).await
    }

    async fn login_once(
        &self,
        seen: u64,
        stale: Option<&Credentials>,
    ) -> Result<Credentials, AuthError> {
        let _guard = self.login_lock.lock().await;

        {
            let state = self.state.read();
            if state.attempts != seen {
                tracing::debug!("Reusing outcome of concurrent login");
                return state.last_outcome();
            }
            if let (Some(stale), Some(current)) = (stale, &state.credentials)
                && current.access_token() != stale.access_token()
            {
                return Ok(current.clone());
            }
        }

        let outcome = self.login().await;

        let mut state = self.state.write();
        state.attempts += 1;
        match &outcome {
            Ok(credentials) => {
                tracing::debug!(user_id = %credentials.user_id(), "Authentication successful");
                state.credentials = Some(credentials.clone());
                state.last_failure = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "Authentication failed");
                state.credentials = None;
                state.last_failure = Some(err.clone());
            }
        }
        outcome
    }

    async fn login(&self) -> Result<Credentials, AuthError> {
        tracing::debug!(url = %self.login_url, "Logging in");

        let body = serde_json::json!({
            "user_name": self.username,
            "password": self.password,
        });

        let response = self
            .client
            .post(&self.login_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let login: LoginResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::MalformedToken(format!("login response: {e}")))?;

        let access_token = login
            .access_token
            .ok_or(AuthError::MissingField("accesstoken"))?;
        let id_token = login.id_token.ok_or(AuthError::MissingField("idtoken"))?;
        let user_id = user_id_from_id_token(&id_token)?;

        let credentials = Credentials::new(access_token, user_id);
        Ok(match login.refresh_token {
            Some(refresh) => credentials.with_refresh_token(refresh),
            None => credentials,
        })
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("authenticated", &self.state.read().credentials.is_some())
            .finish_non_exhaustive()
    }
}
