//! Authentication failure taxonomy.
//!
//! Every variant except `NetworkUnavailable` is a per-token rejection and
//! maps to 401. `NetworkUnavailable` means no key set could ever be loaded
//! and maps to 503 so it is not confused with a bad credential.

use thiserror::Error;

/// Why a credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or not a `Bearer` credential.
    #[error("Missing bearer token")]
    MissingCredential,

    /// Token is not a structurally valid JWT.
    #[error("Malformed token")]
    Malformed,

    /// Token header carries no key id.
    #[error("Missing kid in token header")]
    MissingKeyId,

    /// Key id not present in the provider key set, even after a refresh.
    #[error("Unknown signing key")]
    UnknownKey,

    /// Signature, algorithm, expiry, not-before or issuer check failed.
    /// The reason is for server-side logs only.
    #[error("Invalid token: {0}")]
    InvalidSignatureOrClaims(String),

    /// `token_use` claim does not match the deployment's expected class.
    #[error("Wrong token_use")]
    WrongTokenUse,

    /// `aud` / `client_id` does not name this application's client.
    #[error("Token was issued to a different client")]
    WrongClient,

    /// Key set fetch failed and nothing was cached to fall back on.
    #[error("Authentication keys unavailable")]
    NetworkUnavailable,
}

impl AuthError {
    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Malformed => "malformed",
            AuthError::MissingKeyId => "missing_kid",
            AuthError::UnknownKey => "unknown_key",
            AuthError::InvalidSignatureOrClaims(_) => "invalid_signature_or_claims",
            AuthError::WrongTokenUse => "wrong_token_use",
            AuthError::WrongClient => "wrong_client",
            AuthError::NetworkUnavailable => "network_unavailable",
        }
    }
}
