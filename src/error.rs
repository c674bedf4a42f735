// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `LivHub` library.
//!
//! Each concern of the bridge has its own error enum: authentication,
//! HTTP transport, payload normalization, value validation and poll cycles.
//! They fold into the crate-level [`Error`] so callers can use `?` freely.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication against the vendor cloud failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// An HTTP request to the vendor cloud failed.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// A vendor payload could not be normalized.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A value was outside its allowed range.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A poll cycle produced no usable state.
    #[error("update failed: {0}")]
    Update(#[from] UpdateFailed),

    /// The addressed device is not present in the state store.
    #[error("device {device_name:?} not found on node {node_id:?}")]
    DeviceNotFound {
        /// Node that was addressed.
        node_id: String,
        /// Device that was addressed.
        device_name: String,
    },
}

/// Errors produced while logging in.
///
/// This type is `Clone` so one login outcome can be handed to every caller
/// that was waiting on the same attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The login endpoint answered with a non-200 status.
    #[error("login rejected with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The login response lacked a required field.
    #[error("login response is missing {0}")]
    MissingField(&'static str),

    /// The identity token could not be decoded.
    #[error("malformed identity token: {0}")]
    MalformedToken(String),

    /// The login request never produced a response.
    #[error("login request failed: {0}")]
    Network(String),
}

/// Errors related to authenticated requests against the vendor API.
#[derive(Debug, Error)]
pub enum RequestError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Every attempt timed out.
    #[error("request timed out after {attempts} attempts")]
    Timeout {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The credential could not be (re)established.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The configured base URL or path is unusable.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while normalizing vendor payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Unexpected payload shape.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),

    /// Failed to interpret a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A hue value is outside the valid range (0-360).
    #[error("hue value {0} is out of range [0, 360]")]
    InvalidHue(u16),
}

/// A poll cycle failed; the store keeps its last-known-good state.
#[derive(Debug, Error)]
pub enum UpdateFailed {
    /// The account reported no nodes.
    #[error("no nodes found")]
    NoNodes,

    /// Nodes were listed but none could be fetched and normalized.
    #[error("none of {attempted} nodes produced usable state")]
    NoUsableNodes {
        /// Number of nodes that were attempted.
        attempted: usize,
    },

    /// The node list could not be fetched.
    #[error("error communicating with API: {0}")]
    Request(#[from] RequestError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
