//! wya? backend service library.
//!
//! Authenticates requests with bearer tokens issued by the identity
//! provider (a Cognito user pool) and serves the HTTP surface around it.
//!
//! # Modules
//!
//! - `auth` - key set cache, token verification, authentication gate
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Required/optional authentication layers
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
