//! Provider signing keys.
//!
//! A [`KeySet`] is one immutable snapshot of the identity provider's JWKS.
//! It is built wholesale from a single fetch and replaced wholesale on
//! refresh, so a reader never sees keys from two different fetches. An
//! invalidated snapshot keeps its keys for fallback but is never fresh.

use serde::Deserialize;
use std::collections::HashMap;
use tokio::time::Instant;

/// JSON Web Key as published by the provider.
///
/// Cognito publishes RSA keys (`n`, `e`); OKP (Ed25519) keys (`crv`, `x`)
/// are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key ID - selects this key for a token's `kid` header.
    pub kid: String,

    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Signing algorithm bound to this key (e.g. "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// OKP curve name.
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,
}

/// Body of the provider's `/.well-known/jwks.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

/// Immutable snapshot of provider keys, indexed by key id.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
    invalidated: bool,
}

impl KeySet {
    /// Build a snapshot stamped with the current time.
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self::fetched_at(keys, Instant::now())
    }

    /// Build a snapshot with an explicit fetch time.
    pub fn fetched_at(keys: Vec<Jwk>, fetched_at: Instant) -> Self {
        let keys = keys.into_iter().map(|key| (key.kid.clone(), key)).collect();
        Self {
            keys,
            fetched_at,
            invalidated: false,
        }
    }

    /// Copy of this snapshot marked as invalidated.
    pub fn to_invalidated(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            fetched_at: self.fetched_at,
            invalidated: true,
        }
    }

    /// Whether this snapshot was explicitly invalidated.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Look up a key by id.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    /// When this snapshot was fetched.
    pub fn fetched_at_instant(&self) -> Instant {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<JwksResponse> for KeySet {
    fn from(response: JwksResponse) -> Self {
        KeySet::new(response.keys)
    }
}
