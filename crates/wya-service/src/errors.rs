//! HTTP error type for the wya? service.
//!
//! Messages returned to clients are generic. The underlying reason is
//! logged server-side.

use crate::auth::AuthError;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"wya-api\", error=\"invalid_token\"";

/// Service error type.
///
/// Maps to HTTP status codes:
/// - InvalidToken: 401 Unauthorized
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-safe message.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidToken(_) => 401,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NetworkUnavailable => {
                ApiError::ServiceUnavailable("identity provider keys unavailable".to_string())
            }
            AuthError::MissingCredential => {
                ApiError::InvalidToken("Missing or malformed Authorization header".to_string())
            }
            other => {
                tracing::debug!(target: "wya.errors", error = %other, "Mapping auth failure to 401");
                ApiError::InvalidToken("The access token is invalid or expired".to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidToken(message) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", message),
            ApiError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "wya.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidToken(String::new()).status_code(), 401);
        assert_eq!(ApiError::ServiceUnavailable(String::new()).status_code(), 503);
    }

    #[test]
    fn test_auth_errors_map_to_401() {
        let rejections = [
            AuthError::MissingCredential,
            AuthError::Malformed,
            AuthError::MissingKeyId,
            AuthError::UnknownKey,
            AuthError::InvalidSignatureOrClaims("ExpiredSignature".to_string()),
            AuthError::WrongTokenUse,
            AuthError::WrongClient,
        ];

        for err in rejections {
            assert_eq!(ApiError::from(err).status_code(), 401);
        }
    }

    #[test]
    fn test_network_unavailable_maps_to_503() {
        assert_eq!(ApiError::from(AuthError::NetworkUnavailable).status_code(), 503);
    }

    #[tokio::test]
    async fn test_invalid_token_response() {
        let response = ApiError::from(AuthError::InvalidSignatureOrClaims(
            "InvalidSignature".to_string(),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("WWW-Authenticate").unwrap(),
            "Bearer realm=\"wya-api\", error=\"invalid_token\""
        );

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
        assert!(
            !body["error"]["message"].as_str().unwrap().contains("InvalidSignature"),
            "verification detail must not reach the client"
        );
    }

    #[tokio::test]
    async fn test_service_unavailable_response() {
        let response = ApiError::from(AuthError::NetworkUnavailable).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("WWW-Authenticate").is_none());

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(body["error"]["message"], "Service temporarily unavailable");
    }
}
