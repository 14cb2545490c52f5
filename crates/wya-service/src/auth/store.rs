//! Cached provider key set with TTL and explicit invalidation.
//!
//! The cache slot is an [`ArcSwapOption`] holding an immutable
//! [`KeySet`]. Readers load the current snapshot without locking, and a
//! refresh installs a new snapshot in a single atomic store, so no reader
//! ever sees a mix of old and new keys. No lock is held while fetching.
//!
//! Lifecycle: empty → populated → (expired | invalidated) → repopulated.
//! An invalidation completed by one request is visible to every later
//! `get`, which will then fetch. Expired and invalidated snapshots stay in
//! the slot as the fallback when that fetch fails.

use crate::auth::error::AuthError;
use crate::auth::fetcher::KeySetFetcher;
use crate::auth::key_set::{Jwk, KeySet};
use crate::observability::metrics;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Default key set TTL (1 hour).
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Process-wide cache of the provider key set.
pub struct KeySetStore {
    /// Provider JWKS endpoint.
    jwks_url: String,

    /// Maximum snapshot age before `get` refreshes.
    ttl: Duration,

    fetcher: Arc<dyn KeySetFetcher>,

    cached: ArcSwapOption<KeySet>,
}

impl KeySetStore {
    pub fn new(jwks_url: String, ttl: Duration, fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            jwks_url,
            ttl,
            fetcher,
            cached: ArcSwapOption::empty(),
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached key set, fetching when empty or older than the TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkUnavailable` if a fetch was needed, it
    /// failed, and no earlier key set is cached. When an earlier (stale)
    /// key set is cached, it is returned instead of the error.
    #[instrument(skip(self), name = "wya.auth.jwks.get")]
    pub async fn get(&self) -> Result<Arc<KeySet>, AuthError> {
        let current = self.cached.load_full();

        if let Some(key_set) = current.as_ref() {
            if !key_set.is_invalidated() && !self.is_expired(key_set) {
                metrics::record_jwks_cache_lookup("hit");
                return Ok(Arc::clone(key_set));
            }
            tracing::debug!(
                target: "wya.auth.jwks",
                invalidated = key_set.is_invalidated(),
                "JWKS cache needs refresh"
            );
        }
        metrics::record_jwks_cache_lookup("miss");

        match self.fetcher.fetch(&self.jwks_url).await {
            Ok(key_set) => {
                let key_set = Arc::new(key_set);
                self.cached.store(Some(Arc::clone(&key_set)));
                tracing::info!(
                    target: "wya.auth.jwks",
                    key_count = key_set.len(),
                    "JWKS cache refreshed"
                );
                Ok(key_set)
            }
            Err(e) => match self.cached.load_full() {
                Some(stale) => {
                    tracing::warn!(
                        target: "wya.auth.jwks",
                        error = %e,
                        "JWKS refresh failed, serving stale key set"
                    );
                    Ok(stale)
                }
                None => {
                    tracing::error!(
                        target: "wya.auth.jwks",
                        error = %e,
                        "JWKS refresh failed with no cached key set"
                    );
                    Err(AuthError::NetworkUnavailable)
                }
            },
        }
    }

    /// Mark the cached key set as invalidated so the next `get` fetches.
    ///
    /// The invalidated keys remain available as the stale fallback if that
    /// fetch fails. Idempotent: invalidating an empty store does nothing.
    pub fn invalidate(&self) {
        let previous = self.cached.rcu(|current| {
            current
                .as_ref()
                .map(|key_set| Arc::new(key_set.to_invalidated()))
        });
        if previous.is_some_and(|key_set| !key_set.is_invalidated()) {
            tracing::debug!(target: "wya.auth.jwks", "JWKS cache invalidated");
        }
    }

    /// Look up a key by id, loading the key set if needed.
    ///
    /// # Errors
    ///
    /// Propagates `get` failures.
    pub async fn find(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        let key_set = self.get().await?;
        Ok(key_set.find(kid).cloned())
    }

    /// Current snapshot without triggering a fetch.
    pub fn snapshot(&self) -> Option<Arc<KeySet>> {
        self.cached.load_full()
    }

    fn is_expired(&self, key_set: &KeySet) -> bool {
        Instant::now().saturating_duration_since(key_set.fetched_at_instant()) > self.ttl
    }
}
