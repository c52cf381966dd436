//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_tiss::{TissError, ValidationFinding};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Claim records exist but cannot form a document
    #[error("Incomplete record: {0}")]
    IncompleteRecord(String),

    /// The generated document failed validation
    #[error("Generated document is invalid")]
    InvalidDocument(Vec<ValidationFinding>),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<ValidationFinding>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, findings) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::IncompleteRecord(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "incomplete_record", None)
            }
            ApiError::InvalidDocument(findings) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_document", Some(findings))
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            findings,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TissError> for ApiError {
    fn from(err: TissError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_incomplete() {
            ApiError::IncompleteRecord(err.to_string())
        } else {
            error!(error = %err, "TISS codec failure");
            ApiError::Internal(err.to_string())
        }
    }
}
