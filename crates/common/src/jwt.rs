//! JWT helpers that run before any signature verification.
//!
//! Bearer tokens issued by the identity provider carry the signing key id
//! (`kid`) in their header. Callers need that id to pick a key out of the
//! provider's key set, so the header is read *unverified* here and the
//! token is verified afterwards with the selected key.
//!
//! # Security
//!
//! - Tokens are size-checked before any base64 or JSON work
//! - Nothing returned from this module is trustworthy until the signature
//!   has been verified by the caller
//! - Error messages are generic; details go to debug logs only

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// Provider tokens are typically 800-1500 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for temporal claims (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Upper bound on configurable clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a token can be rejected before signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not three base64url segments with a JSON object header.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Header has no usable `kid`.
    #[error("The access token is invalid or expired")]
    MissingKid,

    /// `iat` lies further in the future than the allowed skew.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Header
// =============================================================================

/// The parts of a token header needed to select a verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHeader {
    /// Key id naming the provider key that signed the token.
    pub kid: String,

    /// Algorithm the token claims to be signed with. Informational only:
    /// the verifier must take the algorithm from the key material.
    pub alg: Option<String>,
}

/// Parse a token header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` if the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` if the token is not `header.payload.signature`, the
///   header is not base64url, or it does not decode to a JSON object
/// - `MissingKid` if `kid` is absent, empty, or not a string
pub fn parse_unverified_header(token: &str) -> Result<UnverifiedHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: oversized"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header_segment), Some(_payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: expected three segments");
        return Err(JwtValidationError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token header is not base64url");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token header is not JSON");
        JwtValidationError::MalformedToken
    })?;

    let Some(fields) = header.as_object() else {
        tracing::debug!(target: "common.jwt", "Token header is not a JSON object");
        return Err(JwtValidationError::MalformedToken);
    };

    let kid = fields
        .get("kid")
        .and_then(serde_json::Value::as_str)
        .filter(|kid| !kid.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    let alg = fields
        .get("alg")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string);

    Ok(UnverifiedHeader { kid, alg })
}

// =============================================================================
// Claim timing
// =============================================================================

/// Reject tokens whose `iat` is more than `clock_skew` ahead of now.
///
/// Expiry and not-before are handled by the signature verifier; this covers
/// the issued-at claim, which the verifier ignores.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` when `iat > now + clock_skew`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

/// [`validate_iat`] against an explicit `now`, for boundary tests.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let latest_allowed = now.saturating_add(skew_secs);

    if iat > latest_allowed {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            latest_allowed = latest_allowed,
            "Token rejected: iat in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Decode the base64url `x` member of an OKP (Ed25519) JWK into raw key bytes.
///
/// # Errors
///
/// Returns `base64::DecodeError` if `x` is not unpadded base64url.
pub fn decode_okp_public_key(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}

// =============================================================================
// Tests
// =============================================================================
