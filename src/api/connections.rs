use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use together_core::dates::day_key;
use together_core::models::{AnswerConnectionInput, DailyConnection};

use super::{ApiError, AppState, UserId};

pub async fn list(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<Vec<DailyConnection>>, ApiError> {
    Ok(Json(state.db.list_connections_by_couple(couple_id)?))
}

/// Today's question for the couple, created on first request. The question
/// is generated; a fallback question stands in when the LLM is down, so
/// the day always has one.
pub async fn today(
    State(state): State<AppState>,
    _user: UserId,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<DailyConnection>, ApiError> {
    state
        .db
        .get_couple(couple_id)?
        .ok_or(ApiError::NotFound("couple"))?;

    let today = day_key(Utc::now());
    if let Some(existing) = state.db.get_connection_for_day(couple_id, today)? {
        return Ok(Json(existing));
    }

    let question = state.llm.daily_question().await;
    match state.db.create_connection(couple_id, today, question) {
        Ok(created) => Ok(Json(created)),
        // Both partners can race to create the day's row; the unique index
        // makes one insert lose, and the winner's row is the answer.
        Err(err) => match state.db.get_connection_for_day(couple_id, today)? {
            Some(existing) => Ok(Json(existing)),
            None => Err(err.into()),
        },
    }
}

pub async fn answer(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<AnswerConnectionInput>,
) -> Result<Json<DailyConnection>, ApiError> {
    if input.text.trim().is_empty() {
        return Err(ApiError::validation("text", "answer text is required"));
    }
    let connection = state
        .db
        .get_connection(id)?
        .ok_or(ApiError::NotFound("daily connection"))?;
    let answered = connection.with_answer(user, input.text);
    Ok(Json(state.db.save_connection_answers(&answered)?))
}
