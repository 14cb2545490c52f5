//! HTTP middleware for the wya? service.
//!
//! # Components
//!
//! - `auth` - required and optional authentication layers

pub mod auth;

pub use auth::{optional_auth, require_auth, ClaimsExt};
