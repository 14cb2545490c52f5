//! Liveness and status handlers.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Response for `/`.
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Response for `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,

    /// User pool region.
    pub region: String,

    /// Issuer tokens are verified against.
    pub issuer: String,

    /// Whether an app client id is configured.
    pub client_id_set: bool,

    /// Accepted token class ("id" or "access").
    pub token_use: String,
}

/// Handler for GET /
#[instrument(skip_all, name = "wya.handlers.root")]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "wya? backend is running".to_string(),
    })
}

/// Handler for GET /health
///
/// Reports the auth configuration without touching the identity provider,
/// so it stays up while the JWKS endpoint is unreachable.
///
/// ```json
/// {
///   "status": "ok",
///   "region": "us-east-1",
///   "issuer": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEf",
///   "client_id_set": true,
///   "token_use": "access"
/// }
/// ```
#[instrument(skip_all, name = "wya.handlers.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = &state.config;

    Json(HealthResponse {
        status: "ok".to_string(),
        region: config.region.clone(),
        issuer: state.auth_gate.policy().issuer.clone(),
        client_id_set: !config.client_id.is_empty(),
        token_use: config.token_use.to_string(),
    })
}
