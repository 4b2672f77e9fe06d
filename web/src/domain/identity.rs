//! The signed-in caller and the token claims it is derived from.
//!
//! Tokens are issued by the backend API. This side only reads the payload
//! segment to learn who the caller is; the signature is deliberately left
//! unchecked because the backend re-verifies the token on every authenticated
//! call and this server holds no verification key.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Claims read from a backend token's payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// User id; the backend encodes numeric ids as JSON numbers.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    pub role: String,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Expiry as a timestamp, when present and representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) if !value.is_empty() => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a non-empty string or a number, got {other}"
        ))),
    }
}

/// Reasons a token payload could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenDecodeError {
    /// The token is not three dot-separated segments.
    #[error("token is not a three-segment JWT")]
    Malformed,
    /// The payload segment is not base64url.
    #[error("token payload is not base64url: {message}")]
    Encoding { message: String },
    /// The payload is not JSON or lacks `id`, `email` or `role`.
    #[error("token payload is missing required claims: {message}")]
    Claims { message: String },
}

/// Read the claims of `token` without verifying its signature.
///
/// # Examples
/// ```
/// use threads_web::domain::decode_unverified_claims;
///
/// // {"id":7,"email":"a@b.io","role":"user"}
/// let token = "e30.eyJpZCI6NywiZW1haWwiOiJhQGIuaW8iLCJyb2xlIjoidXNlciJ9.sig";
/// let claims = decode_unverified_claims(token).expect("claims");
/// assert_eq!(claims.id, "7");
/// ```
pub fn decode_unverified_claims(token: &str) -> Result<TokenClaims, TokenDecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenDecodeError::Malformed);
    };
    // Some issuers pad the segment even though JWT forbids it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| TokenDecodeError::Encoding {
            message: err.to_string(),
        })?;
    serde_json::from_slice(&bytes).map_err(|err| TokenDecodeError::Claims {
        message: err.to_string(),
    })
}

/// The caller's identity as held in the session cookie.
///
/// ## Invariants
/// - Built only from decoded claims plus the token they came from.
/// - Immutable: a refreshed token produces a new `Identity`.
/// - `token` is carried verbatim and never inspected after construction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: String,
    email: String,
    role: String,
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expire: Option<String>,
}

impl Identity {
    /// Combine decoded claims with the raw token and the backend's expiry marker.
    /// Without a marker, the token's own `exp` is used in RFC 3339 form.
    pub fn new(claims: TokenClaims, token: impl Into<String>, expire: Option<String>) -> Self {
        let expire = expire.or_else(|| claims.expires_at().map(|at| at.to_rfc3339()));
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
            token: token.into(),
            expire,
        }
    }

    /// Decode `token` and build the identity in one step.
    pub fn from_token(token: &str, expire: Option<String>) -> Result<Self, TokenDecodeError> {
        decode_unverified_claims(token).map(|claims| Self::new(claims, token, expire))
    }

    /// Backend user id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Account email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Account role, e.g. `user` or `admin`.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Bearer token for authenticated backend calls.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expiry marker as reported by the backend at login.
    pub fn expire(&self) -> Option<&str> {
        self.expire.as_deref()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .field("expire", &self.expire)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use rstest::rstest;
    use serde_json::json;

    fn token_for(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"backend-only-secret"),
        )
        .expect("encode token")
    }

    #[test]
    fn decodes_numeric_ids_without_the_signing_key() {
        let token = token_for(&json!({
            "id": 42, "email": "kin@example.vn", "role": "user", "exp": 1_900_000_000
        }));
        let claims = decode_unverified_claims(&token).expect("claims");
        assert_eq!(claims.id, "42");
        assert_eq!(claims.email, "kin@example.vn");
        assert_eq!(claims.role, "user");
        assert_eq!(
            claims.expires_at().map(|at| at.timestamp()),
            Some(1_900_000_000)
        );
    }

    #[test]
    fn accepts_string_ids() {
        let token = token_for(&json!({ "id": "u-1", "email": "a@b.io", "role": "admin" }));
        assert_eq!(decode_unverified_claims(&token).expect("claims").id, "u-1");
    }

    #[rstest]
    #[case(json!({ "email": "a@b.io", "role": "user" }))]
    #[case(json!({ "id": 1, "role": "user" }))]
    #[case(json!({ "id": 1, "email": "a@b.io" }))]
    #[case(json!({ "id": "", "email": "a@b.io", "role": "user" }))]
    #[case(json!({ "id": true, "email": "a@b.io", "role": "user" }))]
    fn rejects_payloads_missing_structural_claims(#[case] payload: Value) {
        let err = decode_unverified_claims(&token_for(&payload)).expect_err("must fail");
        assert!(matches!(err, TokenDecodeError::Claims { .. }), "{err:?}");
    }

    #[rstest]
    #[case("")]
    #[case("only.two")]
    #[case("a.b.c.d")]
    fn rejects_non_jwt_shapes(#[case] token: &str) {
        assert_eq!(
            decode_unverified_claims(token),
            Err(TokenDecodeError::Malformed)
        );
    }

    #[test]
    fn rejects_non_base64_payload() {
        let err = decode_unverified_claims("e30.***.sig").expect_err("must fail");
        assert!(matches!(err, TokenDecodeError::Encoding { .. }));
    }

    #[test]
    fn identity_keeps_token_verbatim_and_redacts_debug() {
        let token = token_for(&json!({ "id": 9, "email": "a@b.io", "role": "user" }));
        let identity =
            Identity::from_token(&token, Some("2030-01-01T00:00:00Z".to_owned())).expect("id");
        assert_eq!(identity.token(), token);
        assert_eq!(identity.expire(), Some("2030-01-01T00:00:00Z"));
        assert!(!format!("{identity:?}").contains(&token));
    }

    #[test]
    fn token_expiry_fills_a_missing_backend_marker() {
        let token = token_for(&json!({
            "id": 9, "email": "a@b.io", "role": "user", "exp": 1_900_000_000
        }));
        let identity = Identity::from_token(&token, None).expect("id");
        assert_eq!(identity.expire(), Some("2030-03-17T17:46:40+00:00"));

        let without_exp = token_for(&json!({ "id": 9, "email": "a@b.io", "role": "user" }));
        assert_eq!(Identity::from_token(&without_exp, None).expect("id").expire(), None);
    }
}
