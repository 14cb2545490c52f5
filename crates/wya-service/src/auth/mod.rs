//! Bearer token verification against the identity provider.
//!
//! Components (leaf to root):
//!
//! - `key_set` - JWK and immutable key set snapshot types
//! - `fetcher` - JWKS retrieval over HTTP
//! - `store` - TTL cache with invalidation and stale fallback
//! - `decoder` - signature and standard-claim verification, rotation retry
//! - `policy` - token_use and client rules
//! - `gate` - required/optional identity entry points

pub mod claims;
pub mod decoder;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod key_set;
pub mod policy;
pub mod store;

pub use claims::{Audience, DecodedClaims};
pub use decoder::TokenDecoder;
pub use error::AuthError;
pub use fetcher::{FetchError, HttpKeySetFetcher, KeySetFetcher};
pub use gate::AuthGate;
pub use key_set::{Jwk, JwksResponse, KeySet};
pub use policy::{AuthPolicy, TokenUse};
pub use store::{KeySetStore, DEFAULT_KEY_SET_TTL};
