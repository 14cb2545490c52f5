//! Request-facing authentication entry points.
//!
//! [`AuthGate`] owns the key set store and token decoder for the process.
//! Handlers (through the middleware) call either:
//!
//! - [`AuthGate::require_identity`] - any failure rejects the request
//! - [`AuthGate::optional_identity`] - any failure means anonymous

use crate::auth::claims::DecodedClaims;
use crate::auth::decoder::TokenDecoder;
use crate::auth::error::AuthError;
use crate::auth::fetcher::KeySetFetcher;
use crate::auth::policy::AuthPolicy;
use crate::auth::store::KeySetStore;
use crate::observability::metrics;
use std::sync::Arc;
use tracing::instrument;

const BEARER_PREFIX: &str = "Bearer ";

/// Verifies `Authorization` header values into identity claims.
pub struct AuthGate {
    decoder: TokenDecoder,
}

impl AuthGate {
    /// Build the gate with a fresh, empty key set store for `policy`.
    pub fn new(policy: AuthPolicy, fetcher: Arc<dyn KeySetFetcher>) -> Self {
        let store = Arc::new(KeySetStore::new(
            policy.jwks_url.clone(),
            policy.ttl,
            fetcher,
        ));
        Self {
            decoder: TokenDecoder::new(store, Arc::new(policy)),
        }
    }

    pub fn policy(&self) -> &AuthPolicy {
        self.decoder.policy()
    }

    pub fn store(&self) -> &Arc<KeySetStore> {
        self.decoder.store()
    }

    /// Verify a required credential.
    ///
    /// `header` is the raw `Authorization` value, if the request had one.
    ///
    /// # Errors
    ///
    /// `MissingCredential` when the header is absent or not a bearer
    /// credential, otherwise whatever token verification reports.
    #[instrument(skip_all, name = "wya.auth.require_identity")]
    pub async fn require_identity(&self, header: Option<&str>) -> Result<DecodedClaims, AuthError> {
        let result = match bearer_token(header) {
            Some(token) => self.decoder.decode(token).await,
            None => Err(AuthError::MissingCredential),
        };

        match &result {
            Ok(_) => metrics::record_token_validation("success"),
            Err(e) => {
                tracing::debug!(target: "wya.auth.gate", error = %e, "Credential rejected");
                metrics::record_token_validation(e.kind());
            }
        }

        result
    }

    /// Verify an optional credential; never fails.
    ///
    /// An absent header is anonymous without any verification attempt. A
    /// present but unusable credential is logged and treated as anonymous.
    #[instrument(skip_all, name = "wya.auth.optional_identity")]
    pub async fn optional_identity(&self, header: Option<&str>) -> Option<DecodedClaims> {
        if header.is_none() {
            return None;
        }

        match self.require_identity(header).await {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(
                    target: "wya.auth.gate",
                    error = %e,
                    "Optional credential rejected, continuing anonymously"
                );
                None
            }
        }
    }
}

/// Token part of a `Bearer` credential.
fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?;
    let token = header.strip_prefix(BEARER_PREFIX);
    if token.is_none() {
        tracing::debug!(target: "wya.auth.gate", "Authorization header is not a bearer credential");
    }
    token
}
