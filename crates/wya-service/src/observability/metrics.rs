//! Metrics definitions for the wya? service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `wya_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: `success` or an `AuthError` kind (9 values)
//! - `status`: success, transport_error, status_error, parse_error
//! - `result`: hit, miss

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by
/// `/metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // JWKS fetch buckets up to the 10s client timeout
        .set_buckets_for_metric(
            Matcher::Prefix("wya_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record the outcome of a credential verification.
///
/// Metric: `wya_token_validations_total`
/// Labels: `outcome`
pub fn record_token_validation(outcome: &'static str) {
    counter!("wya_token_validations_total", "outcome" => outcome).increment(1);
}

/// Record a JWKS fetch attempt.
///
/// Metric: `wya_jwks_fetches_total`, `wya_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(status: &'static str, duration: Duration) {
    histogram!("wya_jwks_fetch_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
    counter!("wya_jwks_fetches_total", "status" => status).increment(1);
}

/// Record a key set cache lookup.
///
/// Metric: `wya_jwks_cache_lookups_total`
/// Labels: `result`
pub fn record_jwks_cache_lookup(result: &'static str) {
    counter!("wya_jwks_cache_lookups_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the global no-op recorder; values are verified
    // through /metrics in the integration tests.

    #[test]
    fn test_record_token_validation() {
        record_token_validation("success");
        record_token_validation("unknown_key");
        record_token_validation("network_unavailable");
    }

    #[test]
    fn test_record_jwks_fetch() {
        record_jwks_fetch("success", Duration::from_millis(40));
        record_jwks_fetch("transport_error", Duration::from_secs(10));
        record_jwks_fetch("status_error", Duration::from_millis(5));
        record_jwks_fetch("parse_error", Duration::from_millis(5));
    }

    #[test]
    fn test_record_jwks_cache_lookup() {
        record_jwks_cache_lookup("hit");
        record_jwks_cache_lookup("miss");
    }
}
