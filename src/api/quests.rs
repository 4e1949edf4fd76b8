use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use together_core::dates::day_key;
use together_core::models::{
    CreateQuestInput, NewQuestKind, Quest, QuestStatus, UpdateQuestInput,
};

use super::error::FieldError;
use super::{ApiError, AppState, UserId};

fn validate_kind(kind: &NewQuestKind, errors: &mut Vec<FieldError>) {
    match kind {
        NewQuestKind::Challenge {
            start_date: Some(start),
            end_date: Some(end),
            ..
        } if start > end => {
            errors.push(FieldError::new(
                "end_date",
                "end date must not be before start date",
            ));
        }
        NewQuestKind::Routine {
            weekly_goal: Some(goal),
            ..
        } if !(1..=7).contains(goal) => {
            errors.push(FieldError::new(
                "weekly_goal",
                "weekly goal must be between 1 and 7",
            ));
        }
        _ => {}
    }
}

fn validate_create(input: &CreateQuestInput) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if input.title.trim().is_empty() {
        errors.push(FieldError::new("title", "title is required"));
    }
    if input.category.trim().is_empty() {
        errors.push(FieldError::new("category", "category is required"));
    }
    if input.status == Some(QuestStatus::Completed) {
        errors.push(FieldError::new(
            "status",
            "a quest cannot be created already completed",
        ));
    }
    validate_kind(&input.kind, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn validate_update(input: &UpdateQuestInput) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        errors.push(FieldError::new("title", "title is required"));
    }
    if input
        .category
        .as_deref()
        .is_some_and(|c| c.trim().is_empty())
    {
        errors.push(FieldError::new("category", "category is required"));
    }
    if let Some(kind) = &input.kind {
        validate_kind(kind, &mut errors);
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
) -> Result<Json<Vec<Quest>>, ApiError> {
    Ok(Json(state.db.list_quests_by_couple(couple_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(couple_id): Path<Uuid>,
    Json(input): Json<CreateQuestInput>,
) -> Result<(StatusCode, Json<Quest>), ApiError> {
    validate_create(&input)?;
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;
    let quest = state.db.create_quest(couple_id, user, input)?;
    tracing::info!(quest = %quest.id, kind = quest.kind.kind_str(), "quest created");
    Ok((StatusCode::CREATED, Json(quest)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateQuestInput>,
) -> Result<Json<Quest>, ApiError> {
    validate_update(&input)?;
    let quest = state.db.get_quest(id)?.ok_or(ApiError::NotFound("quest"))?;
    let updated = quest.apply_update(input);
    Ok(Json(state.db.save_quest(&updated)?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_quest(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("quest"))
    }
}

fn transition(
    state: &AppState,
    id: Uuid,
    to: QuestStatus,
    action: &str,
) -> Result<Quest, ApiError> {
    let quest = state.db.get_quest(id)?.ok_or(ApiError::NotFound("quest"))?;
    if !quest.status.can_transition_to(to) {
        return Err(ApiError::validation(
            "status",
            format!("cannot {action} a {} quest", quest.status.as_str()),
        ));
    }
    let mut next = quest;
    next.status = to;
    Ok(state.db.save_quest(&next)?)
}

pub async fn start(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<Quest>, ApiError> {
    Ok(Json(transition(&state, id, QuestStatus::InProgress, "start")?))
}

pub async fn complete(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<Quest>, ApiError> {
    Ok(Json(transition(
        &state,
        id,
        QuestStatus::Completed,
        "complete",
    )?))
}

/// Routine-only progress action. Check-in never advances `status`; it only
/// updates streak and weekly progress, and the stored row is returned as
/// the new source of truth for the client cache.
pub async fn check_in(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<Quest>, ApiError> {
    let quest = state.db.get_quest(id)?.ok_or(ApiError::NotFound("quest"))?;
    let today = day_key(Utc::now());
    let checked = quest.check_in(today).ok_or_else(|| {
        ApiError::validation("kind", "check-in applies to routine quests only")
    })?;
    Ok(Json(state.db.save_quest(&checked)?))
}
