use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use together_core::models::{CreateMemoryInput, Memory, UpdateMemoryInput};

use super::error::FieldError;
use super::{ApiError, AppState, UserId};

pub async fn list(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    Ok(Json(state.db.list_memories_by_couple(couple_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(couple_id): Path<Uuid>,
    Json(input): Json<CreateMemoryInput>,
) -> Result<(StatusCode, Json<Memory>), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "title",
            "title is required",
        )]));
    }
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;
    let memory = state.db.create_memory(couple_id, user, input)?;
    Ok((StatusCode::CREATED, Json(memory)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMemoryInput>,
) -> Result<Json<Memory>, ApiError> {
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::validation("title", "title is required"));
    }
    Ok(Json(state.db.update_memory(id, input)?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_memory(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("memory"))
    }
}
