// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity token decoding.
//!
//! The login response carries an identity token in JWT form. Only its
//! payload is read, to learn the account's user id. The signature is not
//! verified: the token arrives over the TLS session of a successful login
//! and the vendor publishes no key to verify it with.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::error::AuthError;

/// Claim holding the vendor user id.
pub const USER_ID_CLAIM: &str = "custom:user_id";

/// URL-safe alphabet that accepts payloads with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the claims of a three-segment token without verifying it.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the token does not have three
/// segments, the payload is not base64url, or it is not a JSON object.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_header, payload, _signature] = segments.as_slice() else {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthError::MalformedToken(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(AuthError::MalformedToken(e.to_string())),
    }
}

/// Extracts the vendor user id from an identity token.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the token cannot be decoded and
/// [`AuthError::MissingField`] if the user id claim is absent.
pub fn user_id_from_id_token(token: &str) -> Result<String, AuthError> {
    let claims = decode_claims(token)?;
    claims
        .get(USER_ID_CLAIM)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(AuthError::MissingField(USER_ID_CLAIM))
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &Value) -> String {
    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
    format!(
        "{}.{}.{}",
        encode(br#"{"alg":"RS256","typ":"JWT"}"#.as_slice()),
        encode(claims.to_string().as_bytes()),
        encode(b"signature".as_slice())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_user_id() {
        let token = encode_test_token(&json!({"custom:user_id": "user-123", "email": "a@b.c"}));
        assert_eq!(user_id_from_id_token(&token).unwrap(), "user-123");
    }

    #[test]
    fn accepts_padded_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE
            .encode(json!({"custom:user_id": "u"}).to_string());
        let token = format!("h.{payload}.s");
        assert_eq!(user_id_from_id_token(&token).unwrap(), "u");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            decode_claims("only.two"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(matches!(
            decode_claims("h.!!!.s"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_non_object_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("[1,2]");
        assert!(matches!(
            decode_claims(&format!("h.{payload}.s")),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn missing_claim() {
        let token = encode_test_token(&json!({"sub": "x"}));
        assert_eq!(
            user_id_from_id_token(&token),
            Err(AuthError::MissingField(USER_ID_CLAIM))
        );
    }
}
