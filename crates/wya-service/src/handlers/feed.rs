//! Feed handler.
//!
//! Post storage is a separate collaborator; the feed here only reflects
//! whether the caller is signed in.

use crate::auth::DecodedClaims;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/feed`.
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub items: Vec<serde_json::Value>,
    pub signed_in: bool,
}

/// Handler for GET /feed
///
/// Optional authentication: anonymous callers get the same shape with
/// `signed_in: false`.
#[instrument(skip_all, name = "wya.handlers.feed")]
pub async fn get_feed(claims: Option<Extension<DecodedClaims>>) -> Json<FeedResponse> {
    Json(FeedResponse {
        items: Vec::new(),
        signed_in: claims.is_some(),
    })
}
