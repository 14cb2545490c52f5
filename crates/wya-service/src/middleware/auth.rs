//! Authentication middleware.
//!
//! Reads the `Authorization` header, runs it through the [`AuthGate`] and
//! stores the verified [`DecodedClaims`] in request extensions:
//!
//! - `require_auth` - rejects the request on any failure (401, or 503 when
//!   no key set can be loaded)
//! - `optional_auth` - never rejects; claims are only present when the
//!   credential verified

use crate::auth::{AuthGate, DecodedClaims};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Raw `Authorization` header value, if present and valid UTF-8.
fn authorization_header(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?;
    match value.to_str() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(target: "wya.middleware.auth", "Authorization header is not valid UTF-8");
            None
        }
    }
}

/// Authentication middleware for routes that require a signed-in user.
///
/// # Response
///
/// - 401 Unauthorized with `WWW-Authenticate` if the credential is missing or invalid
/// - 503 Service Unavailable if the provider keys cannot be loaded
/// - Otherwise continues with `DecodedClaims` in extensions
#[instrument(skip_all, name = "wya.middleware.require_auth")]
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let claims = gate.require_identity(authorization_header(&req)).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authentication middleware for routes that enrich but do not require identity.
#[instrument(skip_all, name = "wya.middleware.optional_auth")]
pub async fn optional_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> impl IntoResponse {
    if let Some(claims) = gate.optional_identity(authorization_header(&req)).await {
        req.extensions_mut().insert(claims);
    }

    next.run(req).await
}

/// Extension trait for reading verified claims from a request.
pub trait ClaimsExt {
    /// Claims stored by the auth middleware, if any.
    fn claims(&self) -> Option<&DecodedClaims>;
}

impl<B> ClaimsExt for axum::http::Request<B> {
    fn claims(&self) -> Option<&DecodedClaims> {
        self.extensions().get::<DecodedClaims>()
    }
}
