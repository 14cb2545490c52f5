//! Current user handler.

use crate::auth::claims::Audience;
use crate::auth::DecodedClaims;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/whoami`.
#[derive(Debug, Clone, Serialize)]
pub struct WhoAmIResponse {
    pub sub: String,

    pub token_use: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Present on id tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Present on access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl From<DecodedClaims> for WhoAmIResponse {
    fn from(claims: DecodedClaims) -> Self {
        Self {
            email: claims.email().map(ToString::to_string),
            username: claims.username().map(ToString::to_string),
            sub: claims.sub,
            token_use: claims.token_use,
            aud: claims.aud,
            client_id: claims.client_id,
        }
    }
}

/// Handler for GET /whoami
///
/// Requires authentication; returns identity fields from the verified claims.
#[instrument(skip_all, name = "wya.handlers.whoami")]
pub async fn whoami(Extension(claims): Extension<DecodedClaims>) -> Json<WhoAmIResponse> {
    tracing::debug!(target: "wya.handlers.whoami", "Returning caller identity");
    Json(WhoAmIResponse::from(claims))
}
