//! Token verification against the provider key set.
//!
//! # Security Checks
//!
//! 1. Size and structure check on the unverified header (no key lookup for junk)
//! 2. `kid` lookup in the cached key set, with at most one forced refresh
//!    when the key is unknown (provider key rotation)
//! 3. Signature verified with the algorithm bound to the key material; the
//!    token header's `alg` must match it
//! 4. `exp`, `nbf` and `iss` validated, `iat` checked against clock skew
//! 5. Token-class rules from [`AuthPolicy::validate`]
//!
//! Failure reasons are logged at debug level; callers only see the
//! [`AuthError`] category.

use crate::auth::claims::DecodedClaims;
use crate::auth::error::AuthError;
use crate::auth::key_set::Jwk;
use crate::auth::policy::AuthPolicy;
use crate::auth::store::KeySetStore;
use common::jwt::{decode_okp_public_key, parse_unverified_header, validate_iat, JwtValidationError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Forced key set refreshes allowed per verification when the `kid` is unknown.
pub const MAX_ROTATION_REFRESHES: usize = 1;

/// Verifies bearer tokens using the provider key set.
pub struct TokenDecoder {
    store: Arc<KeySetStore>,
    policy: Arc<AuthPolicy>,
}

impl TokenDecoder {
    pub fn new(store: Arc<KeySetStore>, policy: Arc<AuthPolicy>) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<KeySetStore> {
        &self.store
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// - `Malformed` / `MissingKeyId` for unusable headers
    /// - `UnknownKey` if the `kid` is absent even after one refresh
    /// - `NetworkUnavailable` if no key set can be loaded
    /// - `InvalidSignatureOrClaims` for signature, algorithm or claim failures
    /// - `WrongTokenUse` / `WrongClient` from the policy rules
    #[instrument(skip_all, name = "wya.auth.decode")]
    pub async fn decode(&self, token: &str) -> Result<DecodedClaims, AuthError> {
        let header = parse_unverified_header(token).map_err(|e| {
            tracing::debug!(target: "wya.auth.jwt", error = ?e, "Token header rejected");
            match e {
                JwtValidationError::MissingKid => AuthError::MissingKeyId,
                _ => AuthError::Malformed,
            }
        })?;

        tracing::debug!(
            target: "wya.auth.jwt",
            kid = %header.kid,
            alg = ?header.alg,
            "Verifying token"
        );

        let jwk = self.locate_key(&header.kid).await?;

        let claims = verify_token(token, &jwk, &self.policy)?;

        if let Some(iat) = claims.iat {
            validate_iat(iat, self.policy.clock_skew).map_err(|e| {
                tracing::debug!(target: "wya.auth.jwt", error = ?e, "Token iat rejected");
                AuthError::InvalidSignatureOrClaims("iat too far in the future".to_string())
            })?;
        }

        self.policy.validate(&claims)?;

        tracing::debug!(target: "wya.auth.jwt", "Token validated successfully");
        Ok(claims)
    }

    /// Find the key for `kid`, refreshing the key set at most
    /// [`MAX_ROTATION_REFRESHES`] times when it is missing.
    async fn locate_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        for attempt in 0..=MAX_ROTATION_REFRESHES {
            if attempt > 0 {
                tracing::debug!(
                    target: "wya.auth.jwt",
                    kid = %kid,
                    "Key id not in cached key set, forcing refresh"
                );
                self.store.invalidate();
            }

            if let Some(jwk) = self.store.find(kid).await? {
                return Ok(jwk);
            }
        }

        tracing::warn!(target: "wya.auth.jwt", kid = %kid, "Key id not found after refresh");
        Err(AuthError::UnknownKey)
    }
}

/// Verify signature and standard claims with a located key.
fn verify_token(token: &str, jwk: &Jwk, policy: &AuthPolicy) -> Result<DecodedClaims, AuthError> {
    let algorithm = key_algorithm(jwk)?;
    let decoding_key = decoding_key(jwk)?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = policy.clock_skew.as_secs();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // Audience rules differ per token class and live in AuthPolicy::validate
    validation.validate_aud = false;
    validation.set_issuer(&[policy.issuer.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let token_data = decode::<DecodedClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "wya.auth.jwt", kid = %jwk.kid, error = %e, "Token verification failed");
        AuthError::InvalidSignatureOrClaims(e.to_string())
    })?;

    Ok(token_data.claims)
}

/// Algorithm bound to the key material.
///
/// Uses the JWK's `alg`, or the family default when absent. The token's own
/// header `alg` is never consulted here.
fn key_algorithm(jwk: &Jwk) -> Result<Algorithm, AuthError> {
    let algorithm = match (jwk.alg.as_deref(), jwk.kty.as_str()) {
        (Some(alg), _) => Algorithm::from_str(alg).map_err(|_| {
            tracing::warn!(target: "wya.auth.jwt", kid = %jwk.kid, alg = %alg, "Unsupported JWK algorithm");
            AuthError::InvalidSignatureOrClaims(format!("unsupported key algorithm {alg}"))
        })?,
        (None, "RSA") => Algorithm::RS256,
        (None, "OKP") => Algorithm::EdDSA,
        (None, kty) => {
            return Err(unsupported_key_type(jwk, kty));
        }
    };

    let compatible = match jwk.kty.as_str() {
        "RSA" => matches!(
            algorithm,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        "OKP" => algorithm == Algorithm::EdDSA,
        _ => false,
    };

    if !compatible {
        tracing::warn!(
            target: "wya.auth.jwt",
            kid = %jwk.kid,
            kty = %jwk.kty,
            alg = ?algorithm,
            "JWK algorithm does not match key type"
        );
        return Err(AuthError::InvalidSignatureOrClaims(format!(
            "algorithm {algorithm:?} not usable with key type {}",
            jwk.kty
        )));
    }

    Ok(algorithm)
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match jwk.kty.as_str() {
        "RSA" => {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                tracing::error!(target: "wya.auth.jwt", kid = %jwk.kid, "RSA JWK missing n or e");
                return Err(AuthError::InvalidSignatureOrClaims(
                    "RSA key missing components".to_string(),
                ));
            };
            DecodingKey::from_rsa_components(n, e).map_err(|e| {
                tracing::error!(target: "wya.auth.jwt", kid = %jwk.kid, error = %e, "Invalid RSA key components");
                AuthError::InvalidSignatureOrClaims("invalid RSA key".to_string())
            })
        }
        "OKP" => {
            if let Some(crv) = jwk.crv.as_deref() {
                if crv != "Ed25519" {
                    tracing::warn!(target: "wya.auth.jwt", kid = %jwk.kid, crv = %crv, "Unsupported OKP curve");
                    return Err(AuthError::InvalidSignatureOrClaims(format!(
                        "unsupported curve {crv}"
                    )));
                }
            }
            let x = jwk.x.as_deref().ok_or_else(|| {
                tracing::error!(target: "wya.auth.jwt", kid = %jwk.kid, "OKP JWK missing x");
                AuthError::InvalidSignatureOrClaims("OKP key missing x".to_string())
            })?;
            let public_key = decode_okp_public_key(x).map_err(|e| {
                tracing::error!(target: "wya.auth.jwt", kid = %jwk.kid, error = %e, "Invalid OKP key encoding");
                AuthError::InvalidSignatureOrClaims("invalid OKP key".to_string())
            })?;
            Ok(DecodingKey::from_ed_der(&public_key))
        }
        kty => Err(unsupported_key_type(jwk, kty)),
    }
}

fn unsupported_key_type(jwk: &Jwk, kty: &str) -> AuthError {
    tracing::warn!(target: "wya.auth.jwt", kid = %jwk.kid, kty = %kty, "Unsupported JWK key type");
    AuthError::InvalidSignatureOrClaims(format!("unsupported key type {kty}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use std::time::Duration;

    fn jwk(kty: &str, alg: Option<&str>) -> Jwk {
        Jwk {
            kid: "test-key".to_string(),
            kty: kty.to_string(),
            alg: alg.map(ToString::to_string),
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
            crv: None,
            x: None,
        }
    }

    fn policy() -> AuthPolicy {
        AuthPolicy::new(
            "us-east-1",
            "us-east-1_pool",
            "client-123",
            crate::auth::policy::TokenUse::Access,
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    fn unsigned_token(alg: &str) -> String {
        let header = format!(r#"{{"alg":"{alg}","typ":"JWT","kid":"test-key"}}"#);
        let payload = r#"{"sub":"u","iss":"i","exp":9999999999,"token_use":"access"}"#;
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_algorithm_from_jwk_alg() {
        assert_eq!(key_algorithm(&jwk("RSA", Some("RS256"))).unwrap(), Algorithm::RS256);
        assert_eq!(key_algorithm(&jwk("RSA", Some("RS512"))).unwrap(), Algorithm::RS512);
        assert_eq!(key_algorithm(&jwk("OKP", Some("EdDSA"))).unwrap(), Algorithm::EdDSA);
    }

    #[test]
    fn test_algorithm_defaults_by_key_type() {
        assert_eq!(key_algorithm(&jwk("RSA", None)).unwrap(), Algorithm::RS256);
        assert_eq!(key_algorithm(&jwk("OKP", None)).unwrap(), Algorithm::EdDSA);
    }

    #[test]
    fn test_symmetric_algorithm_rejected_for_rsa_key() {
        let err = key_algorithm(&jwk("RSA", Some("HS256"))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignatureOrClaims(_)));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = key_algorithm(&jwk("RSA", Some("none"))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignatureOrClaims(_)));
    }

    #[test]
    fn test_unknown_key_type_rejected() {
        let err = key_algorithm(&jwk("EC", None)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignatureOrClaims(_)));
        assert!(decoding_key(&jwk("oct", Some("HS256"))).is_err());
    }

    #[test]
    fn test_rsa_key_missing_components() {
        let err = decoding_key(&jwk("RSA", Some("RS256"))).err().unwrap();
        assert!(matches!(err, AuthError::InvalidSignatureOrClaims(_)));
    }

    #[test]
    fn test_okp_key_missing_x() {
        let err = decoding_key(&jwk("OKP", Some("EdDSA"))).err().unwrap();
        assert!(matches!(err, AuthError::InvalidSignatureOrClaims(_)));
    }

    #[test]
    fn test_okp_key_invalid_base64() {
        let mut key = jwk("OKP", Some("EdDSA"));
        key.x = Some("!!!invalid-base64!!!".to_string());
        assert!(decoding_key(&key).is_err());
    }

    #[test]
    fn test_okp_key_wrong_curve() {
        let mut key = jwk("OKP", Some("EdDSA"));
        key.crv = Some("X25519".to_string());
        key.x = Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".to_string());
        assert!(decoding_key(&key).is_err());
    }

    #[test]
    fn test_verify_rejects_fake_signature() {
        let mut key = jwk("OKP", Some("EdDSA"));
        key.x = Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".to_string());

        let result = verify_token(&unsigned_token("EdDSA"), &key, &policy());

        assert!(
            matches!(result, Err(AuthError::InvalidSignatureOrClaims(_))),
            "got {result:?}"
        );
    }

    #[test]
    fn test_verify_rejects_header_alg_not_matching_key() {
        let mut key = jwk("OKP", Some("EdDSA"));
        key.x = Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".to_string());

        let result = verify_token(&unsigned_token("HS256"), &key, &policy());

        assert!(
            matches!(result, Err(AuthError::InvalidSignatureOrClaims(_))),
            "got {result:?}"
        );
    }
}
