use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid client input: upload, form field, or JSON body.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No text extracted from PDF")]
    ExtractionEmpty,

    #[error("Unknown or expired session: {0}")]
    SessionNotFound(String),

    /// The generation service failed or returned nothing.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The generation service answered, but not in the format the step requires.
    #[error("Result format error: {0}")]
    ResultFormat(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::ExtractionEmpty | AppError::SessionNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Generation(_) | AppError::ResultFormat(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::ExtractionEmpty => (
                "EXTRACTION_EMPTY",
                "No text extracted from PDF".to_string(),
            ),
            AppError::SessionNotFound(id) => {
                tracing::warn!("Session lookup failed: {id}");
                (
                    "SESSION_NOT_FOUND",
                    "Session is unknown or has expired. Upload the resume again.".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    "GENERATION_ERROR",
                    "The generation service failed to produce a result".to_string(),
                )
            }
            AppError::ResultFormat(msg) => {
                tracing::error!("Result format error: {msg}");
                (
                    "RESULT_FORMAT_ERROR",
                    "The generation service returned an invalid result format".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
