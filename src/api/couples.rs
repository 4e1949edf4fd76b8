use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use together_core::models::{Couple, CreateCoupleInput, Invite, UpdateCoupleInput};

use super::{ApiError, AppState, UserId};

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    Json(input): Json<CreateCoupleInput>,
) -> Result<(StatusCode, Json<Couple>), ApiError> {
    if state.db.get_couple_for_user(user)?.is_some() {
        return Err(ApiError::validation(
            "couple",
            "user already belongs to a couple",
        ));
    }
    let couple = state.db.create_couple(user, input)?;
    tracing::info!(couple = %couple.id, "couple created");
    Ok((StatusCode::CREATED, Json(couple)))
}

/// The caller's couple. A 404 here is the expected "not connected yet"
/// state the client renders as the invite flow.
pub async fn me(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Result<Json<Couple>, ApiError> {
    state
        .db
        .get_couple_for_user(user)?
        .map(Json)
        .ok_or(ApiError::NotFound("couple"))
}

pub async fn update(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCoupleInput>,
) -> Result<Json<Couple>, ApiError> {
    Ok(Json(state.db.update_couple(id, input)?))
}

pub async fn create_invite(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Invite>), ApiError> {
    let couple = state
        .db
        .get_couple(id)?
        .ok_or(ApiError::NotFound("couple"))?;
    if couple.is_connected() {
        return Err(ApiError::validation(
            "couple",
            "couple already has both partners",
        ));
    }
    let invite = state.db.create_invite(id, user)?;
    Ok((StatusCode::CREATED, Json(invite)))
}

/// Redeems a join code from a shared invite URL. An unknown or spent code
/// is the "invalid invite" empty state, not a server error.
pub async fn join(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(code): Path<String>,
) -> Result<Json<Couple>, ApiError> {
    if state.db.get_couple_for_user(user)?.is_some() {
        return Err(ApiError::validation(
            "couple",
            "user already belongs to a couple",
        ));
    }
    let couple = state.db.join_by_code(&code, user)?;
    tracing::info!(couple = %couple.id, "partner joined via invite");
    Ok(Json(couple))
}
