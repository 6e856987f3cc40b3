//! Bearer-credential decoding.
//!
//! Each account is identified by an opaque signed token whose claims
//! embed a serialized user object and an expiry timestamp.  The engine
//! never verifies the signature -- the token is forwarded to the remote
//! service as-is -- it only reads the claims to derive a stable account
//! key, a display name, and the expiry.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;

/// Raw claims as they appear inside the token.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    exp: Option<i64>,
    payload: RawPayload,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    /// The user object, itself a JSON-encoded string.
    user: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(rename = "userId")]
    user_id: Value,
    #[serde(rename = "firstName", default)]
    first_name: String,
    #[serde(rename = "lastName", default)]
    last_name: String,
}

/// Decoded account identity.  Immutable once loaded.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    /// Stable account key, used to bind the persisted fingerprint.
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Expiry derived from the embedded `exp` claim, when present.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccountIdentity {
    /// Decode a bearer credential without verifying its signature.
    pub fn decode(token: &str) -> Result<Self, CoreError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| CoreError::Credential(e.to_string()))?;

        let user: RawUser = serde_json::from_str(&data.claims.payload.user)
            .map_err(|e| CoreError::Credential(format!("bad user payload: {e}")))?;

        let user_id = match user.user_id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        if user_id.is_empty() {
            return Err(CoreError::Credential("empty userId".to_string()));
        }

        let expires_at = data
            .claims
            .exp
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        Ok(Self {
            user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            expires_at,
        })
    }

    /// Whether the credential has expired at `now`.  A token without an
    /// `exp` claim is treated as expired: the remote service will not
    /// accept it and no refresh is attempted.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp <= now,
            None => true,
        }
    }

    /// Human-readable name for logs, e.g. `"Jane Doe"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        exp: i64,
        payload: TestPayload,
    }

    #[derive(Serialize)]
    struct TestPayload {
        user: String,
    }

    fn make_token(user_id: &str, first: &str, last: &str, exp: i64) -> String {
        let user = serde_json::json!({
            "userId": user_id,
            "firstName": first,
            "lastName": last,
        });
        let claims = TestClaims {
            exp,
            payload: TestPayload {
                user: user.to_string(),
            },
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("test token encodes")
    }

    #[test]
    fn decodes_user_fields() {
        let token = make_token("12345", "Jane", "Doe", 4_102_444_800);
        let id = AccountIdentity::decode(&token).unwrap();
        assert_eq!(id.user_id, "12345");
        assert_eq!(id.display_name(), "Jane Doe");
        assert!(id.expires_at.is_some());
    }

    #[test]
    fn numeric_user_id_is_stringified() {
        let user = serde_json::json!({ "userId": 777, "firstName": "N", "lastName": "" });
        let claims = TestClaims {
            exp: 4_102_444_800,
            payload: TestPayload {
                user: user.to_string(),
            },
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        let id = AccountIdentity::decode(&token).unwrap();
        assert_eq!(id.user_id, "777");
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let token = make_token("1", "A", "B", 4_102_444_800); // year 2100
        let id = AccountIdentity::decode(&token).unwrap();
        assert!(!id.is_expired(Utc::now()));
    }

    #[test]
    fn past_expiry_is_expired() {
        let token = make_token("1", "A", "B", 1_000_000_000); // year 2001
        let id = AccountIdentity::decode(&token).unwrap();
        assert!(id.is_expired(Utc::now()));
    }

    #[test]
    fn missing_expiry_counts_as_expired() {
        let id = AccountIdentity {
            user_id: "1".into(),
            first_name: String::new(),
            last_name: String::new(),
            expires_at: None,
        };
        assert!(id.is_expired(Utc::now()));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(AccountIdentity::decode("not-a-token").is_err());
    }

    #[test]
    fn display_name_trims_missing_parts() {
        let token = make_token("9", "Solo", "", 4_102_444_800);
        let id = AccountIdentity::decode(&token).unwrap();
        assert_eq!(id.display_name(), "Solo");
    }
}
