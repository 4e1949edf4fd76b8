use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, UserId};

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Raw image bytes in, public URL out. The stored file is served back
/// under `/uploads/`.
pub async fn upload(
    State(state): State<AppState>,
    _user: UserId,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if query.filename.trim().is_empty() {
        return Err(ApiError::validation("filename", "filename is required"));
    }
    if body.is_empty() {
        return Err(ApiError::validation("file", "file is empty"));
    }
    let url = state
        .images
        .save(&query.filename, &body)
        .map_err(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
