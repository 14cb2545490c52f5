//! Service configuration.
//!
//! Loaded once at boot from environment variables. The app client id is
//! redacted in Debug output.

use crate::auth::{AuthPolicy, TokenUse, DEFAULT_KEY_SET_TTL};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default user pool region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// User pool region (default: "us-east-1").
    pub region: String,

    pub user_pool_id: String,

    /// App client id tokens must be issued to.
    pub client_id: String,

    /// Token class accepted as the bearer credential (default: access).
    pub token_use: TokenUse,

    /// JWKS endpoint override; derived from the pool when unset.
    pub jwks_url: Option<String>,

    /// Key set cache TTL in seconds.
    pub jwks_ttl_seconds: u64,

    /// JWT clock skew tolerance in seconds.
    pub jwt_clock_skew_seconds: u64,

    /// Delay between shutdown signal and exit.
    pub shutdown_drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &"[REDACTED]")
            .field("token_use", &self.token_use)
            .field("jwks_url", &self.jwks_url)
            .field("jwks_ttl_seconds", &self.jwks_ttl_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("shutdown_drain_seconds", &self.shutdown_drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid token use configuration: {0}")]
    InvalidTokenUse(String),

    #[error("Invalid JWKS TTL configuration: {0}")]
    InvalidJwksTtl(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid shutdown drain configuration: {0}")]
    InvalidShutdownDrain(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = non_empty(vars, "BIND_ADDRESS")
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .to_string();

        let region = non_empty(vars, "COGNITO_REGION")
            .unwrap_or(DEFAULT_REGION)
            .to_string();

        let user_pool_id = non_empty(vars, "COGNITO_USER_POOL_ID")
            .or_else(|| non_empty(vars, "USER_POOL_ID"))
            .ok_or_else(|| ConfigError::MissingEnvVar("COGNITO_USER_POOL_ID".to_string()))?
            .to_string();

        let client_id = non_empty(vars, "COGNITO_CLIENT_ID")
            .or_else(|| non_empty(vars, "COGNITO_AUDIENCE"))
            .ok_or_else(|| ConfigError::MissingEnvVar("COGNITO_CLIENT_ID".to_string()))?
            .to_string();

        let token_use = match non_empty(vars, "COGNITO_TOKEN_USE") {
            Some(value) => value.parse().map_err(|e| {
                ConfigError::InvalidTokenUse(format!("COGNITO_TOKEN_USE: {e}"))
            })?,
            None => TokenUse::Access,
        };

        let jwks_url = non_empty(vars, "COGNITO_JWKS_URL").map(ToString::to_string);

        let jwks_ttl_seconds = match non_empty(vars, "JWKS_TTL_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksTtl(format!(
                        "JWKS_TTL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidJwksTtl(
                        "JWKS_TTL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            }
            None => DEFAULT_KEY_SET_TTL.as_secs(),
        };

        let jwt_clock_skew_seconds = match non_empty(vars, "JWT_CLOCK_SKEW_SECONDS") {
            Some(value_str) => {
                let value: i64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{value_str}': {e}"
                    ))
                })?;

                let Ok(value) = u64::try_from(value) else {
                    return Err(ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must be positive, got {value}"
                    )));
                };

                if value == 0 {
                    return Err(ConfigError::InvalidJwtClockSkew(
                        "JWT_CLOCK_SKEW_SECONDS must be positive, got 0".to_string(),
                    ));
                }

                if value > MAX_CLOCK_SKEW.as_secs() {
                    return Err(ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {value}",
                        MAX_CLOCK_SKEW.as_secs()
                    )));
                }

                value
            }
            None => DEFAULT_CLOCK_SKEW.as_secs(),
        };

        let shutdown_drain_seconds = match non_empty(vars, "SHUTDOWN_DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidShutdownDrain(format!(
                    "SHUTDOWN_DRAIN_SECONDS must be a valid non-negative integer, got '{value_str}': {e}"
                ))
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address,
            region,
            user_pool_id,
            client_id,
            token_use,
            jwks_url,
            jwks_ttl_seconds,
            jwt_clock_skew_seconds,
            shutdown_drain_seconds,
        })
    }

    /// Verification policy for the configured user pool.
    pub fn auth_policy(&self) -> AuthPolicy {
        let policy = AuthPolicy::new(
            &self.region,
            &self.user_pool_id,
            &self.client_id,
            self.token_use,
            Duration::from_secs(self.jwks_ttl_seconds),
            Duration::from_secs(self.jwt_clock_skew_seconds),
        );

        match &self.jwks_url {
            Some(url) => policy.with_jwks_url(url.clone()),
            None => policy,
        }
    }
}

/// Value of `key`, treating an empty string as unset.
fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "COGNITO_USER_POOL_ID".to_string(),
                "us-east-1_AbCdEf".to_string(),
            ),
            ("COGNITO_CLIENT_ID".to_string(), "client-123".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.user_pool_id, "us-east-1_AbCdEf");
        assert_eq!(config.client_id, "client-123");
        assert_eq!(config.token_use, TokenUse::Access);
        assert!(config.jwks_url.is_none());
        assert_eq!(config.jwks_ttl_seconds, 3600);
        assert_eq!(config.jwt_clock_skew_seconds, 300);
        assert_eq!(config.shutdown_drain_seconds, 0);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("COGNITO_REGION".to_string(), "eu-west-1".to_string());
        vars.insert("COGNITO_TOKEN_USE".to_string(), "id".to_string());
        vars.insert(
            "COGNITO_JWKS_URL".to_string(),
            "http://localhost:9999/jwks.json".to_string(),
        );
        vars.insert("JWKS_TTL_SECONDS".to_string(), "600".to_string());
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "120".to_string());
        vars.insert("SHUTDOWN_DRAIN_SECONDS".to_string(), "15".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.token_use, TokenUse::Id);
        assert_eq!(
            config.jwks_url.as_deref(),
            Some("http://localhost:9999/jwks.json")
        );
        assert_eq!(config.jwks_ttl_seconds, 600);
        assert_eq!(config.jwt_clock_skew_seconds, 120);
        assert_eq!(config.shutdown_drain_seconds, 15);
    }

    #[test]
    fn test_legacy_variable_fallbacks() {
        let vars = HashMap::from([
            ("USER_POOL_ID".to_string(), "us-east-1_Legacy".to_string()),
            ("COGNITO_AUDIENCE".to_string(), "legacy-client".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.user_pool_id, "us-east-1_Legacy");
        assert_eq!(config.client_id, "legacy-client");
    }

    #[test]
    fn test_primary_variable_wins_over_fallback() {
        let mut vars = base_vars();
        vars.insert("USER_POOL_ID".to_string(), "us-east-1_Legacy".to_string());

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.user_pool_id, "us-east-1_AbCdEf");
    }

    #[test]
    fn test_from_vars_missing_user_pool() {
        let vars = HashMap::from([("COGNITO_CLIENT_ID".to_string(), "client-123".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "COGNITO_USER_POOL_ID")
        );
    }

    #[test]
    fn test_empty_client_id_is_missing() {
        let mut vars = base_vars();
        vars.insert("COGNITO_CLIENT_ID".to_string(), "  ".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "COGNITO_CLIENT_ID"));
    }

    #[test]
    fn test_invalid_token_use() {
        let mut vars = base_vars();
        vars.insert("COGNITO_TOKEN_USE".to_string(), "refresh".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidTokenUse(_))));
    }

    #[test]
    fn test_jwks_ttl_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWKS_TTL_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwksTtl(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_negative() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "-100".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be positive"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "five-minutes".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be a valid integer"))
        );
    }

    #[test]
    fn test_auth_policy_derivation() {
        let mut vars = base_vars();
        vars.insert("COGNITO_REGION".to_string(), "us-west-2".to_string());

        let policy = Config::from_vars(&vars).unwrap().auth_policy();

        assert_eq!(
            policy.issuer,
            "https://cognito-idp.us-west-2.amazonaws.com/us-east-1_AbCdEf"
        );
        assert!(policy.jwks_url.ends_with("/.well-known/jwks.json"));
        assert_eq!(policy.ttl, Duration::from_secs(3600));
        assert_eq!(policy.clock_skew, Duration::from_secs(300));
    }

    #[test]
    fn test_auth_policy_jwks_override() {
        let mut vars = base_vars();
        vars.insert(
            "COGNITO_JWKS_URL".to_string(),
            "http://127.0.0.1:8089/jwks.json".to_string(),
        );

        let policy = Config::from_vars(&vars).unwrap().auth_policy();

        assert_eq!(policy.jwks_url, "http://127.0.0.1:8089/jwks.json");
    }

    #[test]
    fn test_debug_redacts_client_id() {
        let config = Config::from_vars(&base_vars()).unwrap();

        let debug_str = format!("{config:?}");

        assert!(!debug_str.contains("client-123"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
