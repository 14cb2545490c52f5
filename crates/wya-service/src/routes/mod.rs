//! HTTP routes for the wya? service.
//!
//! Defines the Axum router and application state.

use crate::auth::AuthGate;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{optional_auth, require_auth};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Process-wide authentication gate (owns the key set cache).
    pub auth_gate: Arc<AuthGate>,
}

/// Build the application routes.
///
/// - `/`, `/health`, `/metrics` - public
/// - `/feed` - optional authentication
/// - `/whoami` - requires authentication
/// - TraceLayer for request logging
/// - 30 second request timeout
/// - Permissive CORS (any origin, method and header) for browser clients
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let optional_routes = Router::new()
        .route("/feed", get(handlers::get_feed))
        .route_layer(middleware::from_fn_with_state(
            state.auth_gate.clone(),
            optional_auth,
        ));

    let protected_routes = Router::new()
        .route("/whoami", get(handlers::whoami))
        .route_layer(middleware::from_fn_with_state(
            state.auth_gate.clone(),
            require_auth,
        ));

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - Answer preflights before auth runs (innermost)
    // 2. TraceLayer - Log request details
    // 3. TimeoutLayer - Timeout the request
    public_routes
        .merge(metrics_routes)
        .merge(optional_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
