//! Claims carried by a verified provider token.
//!
//! Well-known claims are typed fields; everything else the provider puts in
//! the token (`email`, `cognito:groups`, `scope`, ...) is preserved in
//! `extra`, so the decoded claims equal what was signed. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verified identity claims, attached to the request after authentication.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedClaims {
    /// Subject (user id) - redacted in Debug output.
    pub sub: String,

    /// Issuer URL of the user pool.
    pub iss: String,

    /// Token class: "id" or "access". Empty when the token omits it, which
    /// the policy validator rejects as the wrong token use.
    #[serde(default)]
    pub token_use: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Audience (app client id) - present on id tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// App client id - present on access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// All remaining claims, verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The `aud` claim: a single audience or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `client_id` is one of the audiences.
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == client_id,
            Audience::Many(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

impl fmt::Debug for DecodedClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedClaims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("token_use", &self.token_use)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("aud", &self.aud)
            .field("client_id", &self.client_id)
            .field("extra_claims", &self.extra.len())
            .finish()
    }
}

impl DecodedClaims {
    /// Email address, if the token carries one (id tokens).
    pub fn email(&self) -> Option<&str> {
        self.extra_str("email")
    }

    /// User name: `username` on access tokens, `cognito:username` on id tokens.
    pub fn username(&self) -> Option<&str> {
        self.extra_str("username")
            .or_else(|| self.extra_str("cognito:username"))
    }

    fn extra_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn id_token_claims() -> DecodedClaims {
        serde_json::from_value(serde_json::json!({
            "sub": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "iss": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_example",
            "token_use": "id",
            "exp": 1_700_003_600,
            "iat": 1_700_000_000,
            "aud": "client-123",
            "email": "sam@example.com",
            "cognito:username": "sam",
            "email_verified": true
        }))
        .unwrap()
    }

    #[test]
    fn test_debug_redacts_sub() {
        let debug_str = format!("{:?}", id_token_claims());

        assert!(!debug_str.contains("aaaaaaaa-bbbb"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_unknown_claims_are_preserved() {
        let claims = id_token_claims();

        assert_eq!(claims.extra.get("email_verified"), Some(&serde_json::json!(true)));
        assert!(!claims.extra.contains_key("sub"), "typed claims stay out of extra");
    }

    #[test]
    fn test_id_token_accessors() {
        let claims = id_token_claims();

        assert_eq!(claims.email(), Some("sam@example.com"));
        assert_eq!(claims.username(), Some("sam"));
        assert_eq!(claims.aud, Some(Audience::Single("client-123".to_string())));
        assert!(claims.client_id.is_none());
    }

    #[test]
    fn test_access_token_username() {
        let claims: DecodedClaims = serde_json::from_value(serde_json::json!({
            "sub": "u1",
            "iss": "https://issuer",
            "token_use": "access",
            "exp": 1,
            "client_id": "client-123",
            "username": "sam",
            "scope": "aws.cognito.signin.user.admin"
        }))
        .unwrap();

        assert_eq!(claims.username(), Some("sam"));
        assert!(claims.email().is_none());
        assert_eq!(claims.client_id.as_deref(), Some("client-123"));
    }

    #[test]
    fn test_serialization_is_lossless() {
        let claims = id_token_claims();

        let json = serde_json::to_value(&claims).unwrap();
        let back: DecodedClaims = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(back, claims);
        assert!(json.get("client_id").is_none(), "absent claims are omitted");
    }

    #[test]
    fn test_missing_token_use_decodes_as_empty() {
        let claims: DecodedClaims = serde_json::from_value(serde_json::json!({
            "sub": "u1",
            "iss": "https://issuer",
            "exp": 1
        }))
        .unwrap();
        assert_eq!(claims.token_use, "");
    }

    #[test]
    fn test_audience_list_accepted() {
        let claims: DecodedClaims = serde_json::from_value(serde_json::json!({
            "sub": "u1",
            "iss": "https://issuer",
            "token_use": "id",
            "exp": 1,
            "aud": ["other-client", "client-123"]
        }))
        .unwrap();

        let aud = claims.aud.clone().unwrap();
        assert!(aud.contains("client-123"));
        assert!(aud.contains("other-client"));
        assert!(!aud.contains("client-456"));
        assert_eq!(
            serde_json::to_value(&claims).unwrap()["aud"],
            serde_json::json!(["other-client", "client-123"])
        );
    }

    #[test]
    fn test_audience_of_wrong_type_is_rejected() {
        let result = serde_json::from_value::<DecodedClaims>(serde_json::json!({
            "sub": "u1",
            "iss": "https://issuer",
            "exp": 1,
            "aud": 42
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_sub_is_rejected() {
        let result = serde_json::from_value::<DecodedClaims>(serde_json::json!({
            "iss": "https://issuer",
            "token_use": "id",
            "exp": 1
        }));
        assert!(result.is_err());
    }
}
