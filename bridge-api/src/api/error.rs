//! Error types for the HTTP layer

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::db::SourceError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid query parameter (422)
    #[error("{0}")]
    Validation(String),

    /// Row source failure (500)
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<bridge_common::Error> for ApiError {
    fn from(err: bridge_common::Error) -> Self {
        if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg,
                None,
            ),
            ApiError::Source(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SOURCE_ERROR",
                err.to_string(),
                Some(json!({ "available_tables": err.available_tables() })),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let (Some(details), Value::Object(map)) = (details, &mut error) {
            map.insert("details".to_string(), details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
