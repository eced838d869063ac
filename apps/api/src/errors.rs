use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::matching::runner::RunError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Per-pair comparison failures never reach this type; they only shrink the
/// result set. Only run-level failures surface to callers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Matching error: {0}")]
    Matching(#[from] RunError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Matching(e) => {
                tracing::error!("Matching error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MATCHING_ERROR",
                    "Could not load resumes or job postings for matching".to_string(),
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
