//! HTTP surface.
//!
//! Authentication is an external collaborator; requests arrive with the
//! authenticated user's id in the `x-user-id` header, set by the auth layer
//! in front of this service.

mod activities;
mod connections;
mod couples;
mod discoveries;
mod error;
mod memories;
mod quests;
mod uploads;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use together_core::Database;

use crate::llm::LlmClient;
use crate::storage::ImageStore;

pub use error::{ApiError, FieldError};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub llm: LlmClient,
    pub images: ImageStore,
}

/// The authenticated user, taken from the `x-user-id` header.
pub struct UserId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(UserId)
            .ok_or(ApiError::Unauthorized)
    }
}

pub fn create_router(state: AppState) -> Router {
    let uploads_dir = state.images.root().to_path_buf();

    Router::new()
        // couples & invites
        .route("/api/couples", post(couples::create))
        .route("/api/couples/me", get(couples::me))
        .route("/api/couples/{id}", patch(couples::update))
        .route("/api/couples/{id}/invites", post(couples::create_invite))
        .route("/api/invites/{code}/join", post(couples::join))
        // growth hub
        .route(
            "/api/couples/{couple_id}/quests",
            get(quests::list).post(quests::create),
        )
        .route(
            "/api/quests/{id}",
            patch(quests::update).delete(quests::delete),
        )
        .route("/api/quests/{id}/start", post(quests::start))
        .route("/api/quests/{id}/complete", post(quests::complete))
        .route("/api/quests/{id}/check-in", post(quests::check_in))
        // memories timeline
        .route(
            "/api/couples/{couple_id}/memories",
            get(memories::list).post(memories::create),
        )
        .route(
            "/api/memories/{id}",
            patch(memories::update).delete(memories::delete),
        )
        // activity planner
        .route(
            "/api/couples/{couple_id}/activities",
            get(activities::list).post(activities::create),
        )
        .route(
            "/api/activities/{id}",
            patch(activities::update).delete(activities::delete),
        )
        .route("/api/couples/{couple_id}/date-ideas", post(activities::date_ideas))
        // discovery exchange
        .route(
            "/api/couples/{couple_id}/discoveries",
            get(discoveries::list).post(discoveries::create),
        )
        .route(
            "/api/discoveries/{id}",
            patch(discoveries::update).delete(discoveries::delete),
        )
        .route("/api/discoveries/metadata", post(discoveries::metadata))
        // daily connection
        .route(
            "/api/couples/{couple_id}/connections",
            get(connections::list),
        )
        .route(
            "/api/couples/{couple_id}/connections/today",
            get(connections::today),
        )
        .route("/api/connections/{id}/answer", post(connections::answer))
        // image uploads
        .route("/api/uploads", post(uploads::upload))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
