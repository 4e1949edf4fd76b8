use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use together_core::models::{Activity, CreateActivityInput, UpdateActivityInput};

use super::error::FieldError;
use super::{ApiError, AppState, UserId};

fn validate_titles(title: Option<&str>, category: Option<&str>) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if title.is_some_and(|t| t.trim().is_empty()) {
        errors.push(FieldError::new("title", "title is required"));
    }
    if category.is_some_and(|c| c.trim().is_empty()) {
        errors.push(FieldError::new("category", "category is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub async fn list(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    Ok(Json(state.db.list_activities_by_couple(couple_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(couple_id): Path<Uuid>,
    Json(input): Json<CreateActivityInput>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    validate_titles(Some(&input.title), Some(&input.category))?;
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;
    let activity = state.db.create_activity(couple_id, user, input)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateActivityInput>,
) -> Result<Json<Activity>, ApiError> {
    validate_titles(input.title.as_deref(), input.category.as_deref())?;
    Ok(Json(state.db.update_activity(id, input)?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_activity(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("activity"))
    }
}

#[derive(Debug, Deserialize)]
pub struct DateIdeasRequest {
    pub interests: String,
}

#[derive(Debug, Serialize)]
pub struct DateIdeasResponse {
    pub ideas: Vec<String>,
}

/// Generated date-idea suggestions; always answers, falling back to canned
/// ideas when the LLM is unavailable.
pub async fn date_ideas(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
    Json(request): Json<DateIdeasRequest>,
) -> Result<Json<DateIdeasResponse>, ApiError> {
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;
    let ideas = state.llm.date_ideas(&request.interests).await;
    Ok(Json(DateIdeasResponse { ideas }))
}
