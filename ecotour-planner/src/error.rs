//! Error types for the HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::TourError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. saving without an active tour
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tour planning error
    #[error(transparent)]
    Tour(#[from] TourError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Tour(ref err) => {
                let (status, code) = match err {
                    TourError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    TourError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                    TourError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
                    TourError::Closed => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
                    TourError::EnrichmentMiss { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                    }
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tour_errors_map_to_status() {
        let cases = [
            (TourError::InvalidRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (TourError::upstream("optimization", "down"), StatusCode::BAD_GATEWAY),
            (TourError::Store("locked".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (TourError::Closed, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
