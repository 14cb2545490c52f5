//! Scripted key set fetchers.
//!
//! Drive the key set store without a network and count how many fetches a
//! verification caused.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wya_service::auth::{FetchError, JwksResponse, KeySet, KeySetFetcher};

/// Replays queued JWKS documents or errors; the last entry repeats.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<serde_json::Value, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    /// Serve `script` in order, repeating the final entry once exhausted.
    pub fn sequence(script: Vec<Result<serde_json::Value, FetchError>>) -> Arc<Self> {
        assert!(!script.is_empty(), "script needs at least one entry");
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Serve the same JWKS document on every fetch.
    pub fn always(jwks: serde_json::Value) -> Arc<Self> {
        Self::sequence(vec![Ok(jwks)])
    }

    /// Fail every fetch with a transport error.
    pub fn unreachable() -> Arc<Self> {
        Self::sequence(vec![Err(FetchError::Transport(
            "connection refused".to_string(),
        ))])
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for ScriptedFetcher {
    async fn fetch(&self, _jwks_url: &str) -> Result<KeySet, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        };

        let jwks = next?;
        let response: JwksResponse =
            serde_json::from_value(jwks).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(KeySet::from(response))
    }
}
