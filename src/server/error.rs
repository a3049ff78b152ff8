//! server::error
//!
//! Relay failures as HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::relay::RelayError;

/// Errors a route handler can return.
///
/// Every variant renders as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::Relay(RelayError::Unauthenticated) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Relay(RelayError::StaleVersion(_)) => StatusCode::CONFLICT,
            ApiError::Relay(RelayError::FetchFailed(_) | RelayError::SaveFailed(_)) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Relay(RelayError::Unauthenticated) => ApiError::Unauthenticated.to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), %message, "upstream request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
