use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::overlay::engine::OverlayError;
use crate::upstream::UpstreamError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as an inline status message; nothing propagates as
/// an uncaught fault.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Stale request: {0}")]
    Stale(String),

    #[error("Nothing to display")]
    NothingToDisplay,

    #[error("Upstream error: {0}")]
    Upstream(UpstreamError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::TreeNotFound(job_id) => {
                AppError::NotFound(format!("Skill tree not found for job {job_id}"))
            }
            UpstreamError::ResumeRejected(message) => AppError::Validation(message),
            other => AppError::Upstream(other),
        }
    }
}

impl From<OverlayError> for AppError {
    fn from(_: OverlayError) -> Self {
        AppError::NothingToDisplay
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Stale(msg) => (StatusCode::CONFLICT, "STALE_REQUEST", msg.clone()),
            AppError::NothingToDisplay => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOTHING_TO_DISPLAY",
                "Select a job to view the skill tree".to_string(),
            ),
            AppError::Upstream(err) => {
                tracing::error!("Upstream error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The talent service could not be reached".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
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
