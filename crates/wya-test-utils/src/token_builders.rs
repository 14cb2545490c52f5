//! Builders for provider token claims.

use crate::test_ids::{test_issuer, TEST_CLIENT_ID, TEST_USER_SUB};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for id and access token claims.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::access()
///     .for_user("alice")
///     .expires_in(-60)
///     .build();
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Access token claims: `token_use: access` and `client_id`, no `aud`.
    pub fn access() -> Self {
        let mut builder = Self::base("access");
        builder.set("client_id", json!(TEST_CLIENT_ID));
        builder.set("username", json!("test-user"));
        builder.set("scope", json!("aws.cognito.signin.user.admin"));
        builder
    }

    /// Id token claims: `token_use: id` and `aud`.
    pub fn id() -> Self {
        let mut builder = Self::base("id");
        builder.set("aud", json!(TEST_CLIENT_ID));
        builder.set("email", json!("test-user@example.com"));
        builder.set("cognito:username", json!("test-user"));
        builder
    }

    fn base(token_use: &str) -> Self {
        let now = Utc::now();
        let mut builder = Self { claims: Map::new() };
        builder.set("sub", json!(TEST_USER_SUB));
        builder.set("iss", json!(test_issuer()));
        builder.set("token_use", json!(token_use));
        builder.set("iat", json!(now.timestamp()));
        builder.set("exp", json!((now + Duration::seconds(3600)).timestamp()));
        builder
    }

    fn set(&mut self, name: &str, value: Value) {
        self.claims.insert(name.to_string(), value);
    }

    pub fn for_user(mut self, sub: &str) -> Self {
        self.set("sub", json!(sub));
        self
    }

    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.set("iss", json!(iss));
        self
    }

    pub fn with_token_use(mut self, token_use: &str) -> Self {
        self.set("token_use", json!(token_use));
        self
    }

    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.set("client_id", json!(client_id));
        self
    }

    pub fn with_audience(mut self, aud: &str) -> Self {
        self.set("aud", json!(aud));
        self
    }

    /// Set expiration in seconds from now (negative for expired tokens).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.set("exp", json!((Utc::now() + Duration::seconds(seconds)).timestamp()));
        self
    }

    /// Set `nbf` in seconds from now.
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.set("nbf", json!((Utc::now() + Duration::seconds(seconds)).timestamp()));
        self
    }

    /// Set `iat` in seconds from now.
    pub fn issued_in(mut self, seconds: i64) -> Self {
        self.set("iat", json!((Utc::now() + Duration::seconds(seconds)).timestamp()));
        self
    }

    /// Add or replace an arbitrary claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Remove a claim entirely.
    pub fn without(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_shape() {
        let claims = TestTokenBuilder::access().build();

        assert_eq!(claims["token_use"], "access");
        assert_eq!(claims["client_id"], TEST_CLIENT_ID);
        assert!(claims.get("aud").is_none());
        assert_eq!(claims["iss"], test_issuer());
    }

    #[test]
    fn test_id_claims_shape() {
        let claims = TestTokenBuilder::id().build();

        assert_eq!(claims["token_use"], "id");
        assert_eq!(claims["aud"], TEST_CLIENT_ID);
        assert!(claims.get("client_id").is_none());
    }

    #[test]
    fn test_expired_and_removed_claims() {
        let claims = TestTokenBuilder::access()
            .expires_in(-600)
            .without("token_use")
            .build();

        assert!(claims["exp"].as_i64().unwrap() < Utc::now().timestamp());
        assert!(claims.get("token_use").is_none());
    }
}
