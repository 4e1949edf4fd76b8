use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use together_core::models::{CreateDiscoveryInput, Discovery, UpdateDiscoveryInput};

use crate::llm::UrlMetadata;

use super::{ApiError, AppState, UserId};

pub async fn list(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<Vec<Discovery>>, ApiError> {
    Ok(Json(state.db.list_discoveries_by_couple(couple_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(couple_id): Path<Uuid>,
    Json(input): Json<CreateDiscoveryInput>,
) -> Result<(StatusCode, Json<Discovery>), ApiError> {
    if input.url.trim().is_empty() {
        return Err(ApiError::validation("url", "url is required"));
    }
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title is required"));
    }
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;
    let discovery = state.db.create_discovery(couple_id, user, input)?;
    Ok((StatusCode::CREATED, Json(discovery)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateDiscoveryInput>,
) -> Result<Json<Discovery>, ApiError> {
    Ok(Json(state.db.update_discovery(id, input)?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_discovery(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("discovery"))
    }
}

#[derive(Debug, Deserialize)]
pub struct MetadataRequest {
    pub url: String,
}

/// Pre-fills the share form from a pasted link. Falls back to the bare URL
/// when extraction is unavailable, so sharing never blocks on the LLM.
pub async fn metadata(
    State(state): State<AppState>,
    _user: UserId,
    Json(request): Json<MetadataRequest>,
) -> Result<Json<UrlMetadata>, ApiError> {
    if request.url.trim().is_empty() {
        return Err(ApiError::validation("url", "url is required"));
    }
    Ok(Json(state.llm.url_metadata(&request.url).await))
}
