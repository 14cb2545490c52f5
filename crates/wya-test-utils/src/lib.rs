//! # wya? Test Utilities
//!
//! Shared test utilities for the wya? service.
//!
//! This crate provides:
//! - Deterministic Ed25519 signing keys and JWK documents
//! - Claim builders for id and access tokens
//! - Scripted key set fetchers that count fetches
//! - A wiremock-backed JWKS endpoint with rotation support
//! - Server test harness (TestServer for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wya_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::new(1, "key-1");
//!     let token = keypair.sign(&TestTokenBuilder::access().for_user("alice").build());
//!
//!     let fetcher = ScriptedFetcher::always(jwks_json(&[&keypair]));
//!     let gate = AuthGate::new(test_policy(TokenUse::Access), fetcher.clone());
//!
//!     let claims = gate.require_identity(Some(&bearer(&token))).await?;
//!     assert_eq!(fetcher.calls(), 1);
//! }
//! ```

pub mod crypto_fixtures;
pub mod fetchers;
pub mod jwks_server;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use fetchers::*;
pub use jwks_server::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
