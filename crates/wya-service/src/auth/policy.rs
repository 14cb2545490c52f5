//! User pool policy and provider-specific claim rules.
//!
//! Generic JWT verification (signature, expiry, issuer) happens in the
//! decoder. The rules here are the ones the provider's token classes
//! require on top of that:
//!
//! 1. `token_use` must match the deployment's expected token class
//! 2. id tokens: `aud` must be (or list) this app client
//! 3. access tokens carry no `aud`; `client_id` must be this app client

use crate::auth::claims::DecodedClaims;
use crate::auth::error::AuthError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which provider token class is accepted as the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUse {
    Id,
    Access,
}

impl TokenUse {
    /// Value of the `token_use` claim for this class.
    pub fn as_claim(self) -> &'static str {
        match self {
            TokenUse::Id => "id",
            TokenUse::Access => "access",
        }
    }
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_claim())
    }
}

impl FromStr for TokenUse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(TokenUse::Id),
            "access" => Ok(TokenUse::Access),
            other => Err(format!("expected 'id' or 'access', got '{other}'")),
        }
    }
}

/// Verification policy for one user pool and app client.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,

    /// `https://cognito-idp.{region}.amazonaws.com/{user_pool_id}`
    pub issuer: String,

    /// `{issuer}/.well-known/jwks.json` unless overridden.
    pub jwks_url: String,

    pub expected_token_use: TokenUse,

    /// Key set TTL.
    pub ttl: Duration,

    /// Leeway for exp/nbf and future iat.
    pub clock_skew: Duration,
}

impl AuthPolicy {
    /// Build a policy with issuer and JWKS URL derived from the pool.
    pub fn new(
        region: &str,
        user_pool_id: &str,
        client_id: &str,
        expected_token_use: TokenUse,
        ttl: Duration,
        clock_skew: Duration,
    ) -> Self {
        let issuer = format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}");
        let jwks_url = format!("{issuer}/.well-known/jwks.json");

        Self {
            region: region.to_string(),
            user_pool_id: user_pool_id.to_string(),
            client_id: client_id.to_string(),
            issuer,
            jwks_url,
            expected_token_use,
            ttl,
            clock_skew,
        }
    }

    /// Fetch keys from `jwks_url` instead of the derived endpoint.
    pub fn with_jwks_url(mut self, jwks_url: String) -> Self {
        self.jwks_url = jwks_url;
        self
    }

    /// Apply the token-class rules to signature-verified claims.
    ///
    /// # Errors
    ///
    /// - `WrongTokenUse` if `token_use` differs from the expected class
    /// - `WrongClient` if `aud` (id) or `client_id` (access) is not this client
    pub fn validate(&self, claims: &DecodedClaims) -> Result<(), AuthError> {
        if claims.token_use != self.expected_token_use.as_claim() {
            tracing::debug!(
                target: "wya.auth.policy",
                expected = %self.expected_token_use,
                "Token rejected: wrong token_use"
            );
            return Err(AuthError::WrongTokenUse);
        }

        let issued_to_client = match self.expected_token_use {
            TokenUse::Id => claims
                .aud
                .as_ref()
                .is_some_and(|aud| aud.contains(&self.client_id)),
            TokenUse::Access => claims.client_id.as_deref() == Some(self.client_id.as_str()),
        };

        if !issued_to_client {
            tracing::debug!(
                target: "wya.auth.policy",
                token_use = %self.expected_token_use,
                "Token rejected: issued to a different client"
            );
            return Err(AuthError::WrongClient);
        }

        Ok(())
    }
}
