use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use together_core::DbError;

/// Field-scoped validation message, surfaced inline next to the offending
/// form field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caught before any store call; 422 with per-field messages.
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    /// Expected empty states: no couple yet, unknown invite code, missing
    /// row. Rendered as a distinct 404 payload, not an error toast.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Missing or malformed identity header.
    #[error("unauthorized")]
    Unauthorized,
    /// Store or io failure; logged, surfaced as an opaque 500.
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity } => Self::NotFound(entity),
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": "validation", "fields": fields })),
            )
                .into_response(),
            Self::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "not_found", "entity": entity })),
            )
                .into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response(),
            Self::Internal(err) => {
                tracing::error!(%err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal" })),
                )
                    .into_response()
            }
        }
    }
}
