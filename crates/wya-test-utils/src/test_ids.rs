//! Fixed identifiers for the test user pool.

use std::time::Duration;
use wya_service::auth::{AuthPolicy, TokenUse};

pub const TEST_REGION: &str = "us-east-1";

pub const TEST_USER_POOL_ID: &str = "us-east-1_TestPool";

pub const TEST_CLIENT_ID: &str = "test-app-client";

pub const OTHER_CLIENT_ID: &str = "some-other-app-client";

pub const TEST_USER_SUB: &str = "11111111-2222-3333-4444-555555555555";

/// Issuer derived from [`TEST_REGION`] and [`TEST_USER_POOL_ID`].
pub fn test_issuer() -> String {
    format!("https://cognito-idp.{TEST_REGION}.amazonaws.com/{TEST_USER_POOL_ID}")
}

/// Policy for the test pool with default TTL and clock skew.
pub fn test_policy(token_use: TokenUse) -> AuthPolicy {
    AuthPolicy::new(
        TEST_REGION,
        TEST_USER_POOL_ID,
        TEST_CLIENT_ID,
        token_use,
        Duration::from_secs(3600),
        Duration::from_secs(300),
    )
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_uses_test_issuer() {
        assert_eq!(test_policy(TokenUse::Id).issuer, test_issuer());
    }
}
