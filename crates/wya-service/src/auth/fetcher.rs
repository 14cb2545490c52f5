//! Key set retrieval from the provider's JWKS endpoint.

use crate::auth::key_set::{JwksResponse, KeySet};
use crate::observability::metrics;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::instrument;

/// Upper bound on a single JWKS request, connect through body.
pub const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a key set fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure.
    #[error("JWKS request failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    /// Body was not a JWKS document.
    #[error("JWKS response could not be parsed: {0}")]
    Parse(String),
}

/// Source of provider key sets.
///
/// The store only depends on this trait, so tests can script fetch results
/// and count how many fetches a verification caused.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetch a complete key set from `jwks_url`.
    async fn fetch(&self, jwks_url: &str) -> Result<KeySet, FetchError>;
}

/// Fetches key sets over HTTPS with a fixed timeout.
#[derive(Clone)]
pub struct HttpKeySetFetcher {
    http_client: reqwest::Client,
}

impl HttpKeySetFetcher {
    pub fn new() -> Self {
        Self::with_timeout(JWKS_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "wya.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self { http_client }
    }
}

impl Default for HttpKeySetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    #[instrument(skip(self), name = "wya.auth.jwks.fetch")]
    async fn fetch(&self, jwks_url: &str) -> Result<KeySet, FetchError> {
        let started = Instant::now();
        let result = fetch_key_set(&self.http_client, jwks_url).await;

        let status = match &result {
            Ok(_) => "success",
            Err(FetchError::Transport(_)) => "transport_error",
            Err(FetchError::Status(_)) => "status_error",
            Err(FetchError::Parse(_)) => "parse_error",
        };
        metrics::record_jwks_fetch(status, started.elapsed());

        result
    }
}

async fn fetch_key_set(client: &reqwest::Client, jwks_url: &str) -> Result<KeySet, FetchError> {
    tracing::debug!(target: "wya.auth.jwks", url = %jwks_url, "Fetching JWKS");

    let response = client.get(jwks_url).send().await.map_err(|e| {
        tracing::error!(target: "wya.auth.jwks", error = %e, "Failed to fetch JWKS");
        FetchError::Transport(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(target: "wya.auth.jwks", status = %status, "JWKS endpoint returned error");
        return Err(FetchError::Status(status.as_u16()));
    }

    let jwks: JwksResponse = response.json().await.map_err(|e| {
        tracing::error!(target: "wya.auth.jwks", error = %e, "Failed to parse JWKS response");
        FetchError::Parse(e.to_string())
    })?;

    let key_set = KeySet::from(jwks);
    tracing::info!(target: "wya.auth.jwks", key_count = key_set.len(), "JWKS fetched");

    Ok(key_set)
}
