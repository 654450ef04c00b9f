use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api_client::ApiError;
use crate::persistence::saved_searches::StoreError;
use crate::persistence::snapshot::ImportParseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportParseError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Import(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "IMPORT_PARSE_ERROR",
                e.to_string(),
            ),
            AppError::Upstream(e) => {
                tracing::warn!("Upstream error: {e}");
                upstream_status(e)
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Saved searches could not be written".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
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

/// Pass-through reads keep a backend 4xx status; everything else is a 502.
fn upstream_status(err: &ApiError) -> (StatusCode, &'static str, String) {
    match err {
        ApiError::Network { .. } => (
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_UNAVAILABLE",
            err.user_message(),
        ),
        ApiError::Client { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
            "UPSTREAM_REJECTED",
            err.user_message(),
        ),
        ApiError::Server { .. } | ApiError::Decode(_) => (
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_ERROR",
            err.user_message(),
        ),
    }
}
