use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use together_apart::api::{create_router, AppState};
use together_apart::llm::LlmClient;
use together_apart::storage::ImageStore;
use together_core::models::{Couple, DailyConnection, Quest, QuestKind, QuestStatus};
use together_core::Database;

struct TestApp {
    server: TestServer,
    // Upload directory must outlive the server.
    _uploads: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let state = AppState {
        db,
        // Unreachable endpoint and no key: every LLM call takes the fallback.
        llm: LlmClient::new("http://127.0.0.1:1", None, "test"),
        images: ImageStore::open(uploads.path()).unwrap(),
    };
    TestApp {
        server: TestServer::new(create_router(state)).unwrap(),
        _uploads: uploads,
    }
}

async fn create_couple(app: &TestApp, user: Uuid) -> Couple {
    app.server
        .post("/api/couples")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "anniversary": null }))
        .await
        .json::<Couple>()
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let app = test_app();
    let response = app.server.get("/api/couples/me").await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn me_before_connecting_is_the_not_connected_state() {
    let app = test_app();
    let response = app
        .server
        .get("/api/couples/me")
        .add_header("x-user-id", Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>()["entity"], "couple");
}

#[tokio::test]
async fn invite_flow_connects_a_partner() {
    let app = test_app();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let couple = create_couple(&app, alice).await;

    let invite = app
        .server
        .post(&format!("/api/couples/{}/invites", couple.id))
        .add_header("x-user-id", alice.to_string())
        .await
        .json::<Value>();
    let code = invite["code"].as_str().unwrap().to_string();

    let joined = app
        .server
        .post(&format!("/api/invites/{code}/join"))
        .add_header("x-user-id", bob.to_string())
        .await
        .json::<Couple>();
    assert_eq!(joined.partner_b, Some(bob));

    // Bob now resolves to the same couple.
    let me = app
        .server
        .get("/api/couples/me")
        .add_header("x-user-id", bob.to_string())
        .await
        .json::<Couple>();
    assert_eq!(me.id, couple.id);
}

#[tokio::test]
async fn unknown_invite_code_is_an_invalid_invite() {
    let app = test_app();
    let response = app
        .server
        .post("/api/invites/nosuchcode/join")
        .add_header("x-user-id", Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn quest_validation_is_caught_before_the_store() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let response = app
        .server
        .post(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "  ",
            "category": "",
            "kind": "routine",
            "frequency": "weekly",
            "weekly_goal": 9
        }))
        .await;
    assert_eq!(response.status_code(), 422);
    let body = response.json::<Value>();
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"category"));
    assert!(fields.contains(&"weekly_goal"));

    let quests = app
        .server
        .get(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Vec<Quest>>();
    assert!(quests.is_empty());
}

#[tokio::test]
async fn challenge_date_range_is_validated() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let response = app
        .server
        .post(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "Backwards challenge",
            "category": "misc",
            "kind": "challenge",
            "start_date": "2024-04-30",
            "end_date": "2024-04-01"
        }))
        .await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn routine_lifecycle_start_check_in_complete() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let quest = app
        .server
        .post(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "Nightly call",
            "category": "communication",
            "kind": "routine",
            "frequency": "daily"
        }))
        .await
        .json::<Quest>();
    assert_eq!(quest.status, QuestStatus::Available);

    let started = app
        .server
        .post(&format!("/api/quests/{}/start", quest.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Quest>();
    assert_eq!(started.status, QuestStatus::InProgress);

    let checked = app
        .server
        .post(&format!("/api/quests/{}/check-in", quest.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Quest>();
    match &checked.kind {
        QuestKind::Routine { progress, .. } => {
            assert_eq!(progress.streak, 1);
            assert_eq!(progress.completed_this_week.len(), 1);
        }
        _ => panic!("expected routine"),
    }
    // Check-in never advances status.
    assert_eq!(checked.status, QuestStatus::InProgress);

    // A retried check-in on the same day is a no-op.
    let retried = app
        .server
        .post(&format!("/api/quests/{}/check-in", quest.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Quest>();
    match &retried.kind {
        QuestKind::Routine { progress, .. } => assert_eq!(progress.streak, 1),
        _ => panic!("expected routine"),
    }

    let completed = app
        .server
        .post(&format!("/api/quests/{}/complete", quest.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Quest>();
    assert_eq!(completed.status, QuestStatus::Completed);

    // Completed is terminal.
    let restart = app
        .server
        .post(&format!("/api/quests/{}/start", quest.id))
        .add_header("x-user-id", user.to_string())
        .await;
    assert_eq!(restart.status_code(), 422);
}

#[tokio::test]
async fn check_in_on_a_challenge_is_rejected() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let quest = app
        .server
        .post(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "Photo-a-day",
            "category": "creative",
            "kind": "challenge"
        }))
        .await
        .json::<Quest>();

    let response = app
        .server
        .post(&format!("/api/quests/{}/check-in", quest.id))
        .add_header("x-user-id", user.to_string())
        .await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn editing_a_quest_to_routine_reinitializes_kind_fields() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let quest = app
        .server
        .post(&format!("/api/couples/{}/quests", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "Spring challenge",
            "category": "outdoors",
            "kind": "challenge",
            "start_date": "2024-04-01",
            "end_date": "2024-04-30",
            "restrictions": "weekends only"
        }))
        .await
        .json::<Quest>();

    let edited = app
        .server
        .patch(&format!("/api/quests/{}", quest.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "kind": "routine", "frequency": "daily" }))
        .await
        .json::<Quest>();
    match edited.kind {
        QuestKind::Routine {
            frequency,
            progress,
            ..
        } => {
            assert_eq!(frequency.as_str(), "daily");
            assert_eq!(progress.streak, 0);
            assert!(progress.completed_this_week.is_empty());
        }
        _ => panic!("expected routine after kind switch"),
    }
    assert_eq!(edited.status, quest.status);
}

#[tokio::test]
async fn todays_connection_is_created_once_with_the_fallback_question() {
    let app = test_app();
    let alice = Uuid::new_v4();
    let couple = create_couple(&app, alice).await;

    let first = app
        .server
        .get(&format!("/api/couples/{}/connections/today", couple.id))
        .add_header("x-user-id", alice.to_string())
        .await
        .json::<DailyConnection>();
    assert!(!first.question.is_empty());

    let second = app
        .server
        .get(&format!("/api/couples/{}/connections/today", couple.id))
        .add_header("x-user-id", alice.to_string())
        .await
        .json::<DailyConnection>();
    assert_eq!(second.id, first.id);
    assert_eq!(second.question, first.question);
}

#[tokio::test]
async fn answering_todays_question_round_trips() {
    let app = test_app();
    let alice = Uuid::new_v4();
    let couple = create_couple(&app, alice).await;

    let connection = app
        .server
        .get(&format!("/api/couples/{}/connections/today", couple.id))
        .add_header("x-user-id", alice.to_string())
        .await
        .json::<DailyConnection>();

    let answered = app
        .server
        .post(&format!("/api/connections/{}/answer", connection.id))
        .add_header("x-user-id", alice.to_string())
        .json(&json!({ "text": "The park near my office" }))
        .await
        .json::<DailyConnection>();
    assert_eq!(answered.answers.len(), 1);
    assert_eq!(answered.answers[0].text, "The park near my office");
}

#[tokio::test]
async fn memory_lifecycle_over_http() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    // Validation is caught before the store.
    let invalid = app
        .server
        .post(&format!("/api/couples/{}/memories", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "title": "   ", "memory_date": "2023-11-18" }))
        .await;
    assert_eq!(invalid.status_code(), 422);

    let created = app
        .server
        .post(&format!("/api/couples/{}/memories", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "title": "First visit",
            "memory_date": "2023-11-18",
            "location": "Lisbon"
        }))
        .await;
    assert_eq!(created.status_code(), 201);
    let memory = created.json::<Value>();

    let patched = app
        .server
        .patch(&format!("/api/memories/{}", memory["id"].as_str().unwrap()))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "photo_url": "/uploads/abc-airport.jpg" }))
        .await
        .json::<Value>();
    assert_eq!(patched["photo_url"], "/uploads/abc-airport.jpg");
    assert_eq!(patched["location"], "Lisbon");

    let deleted = app
        .server
        .delete(&format!("/api/memories/{}", memory["id"].as_str().unwrap()))
        .add_header("x-user-id", user.to_string())
        .await;
    assert_eq!(deleted.status_code(), 204);

    let listed = app
        .server
        .get(&format!("/api/couples/{}/memories", couple.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json::<Vec<Value>>();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn discovery_share_and_reaction_over_http() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let missing_url = app
        .server
        .post(&format!("/api/couples/{}/discoveries", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "url": "", "title": "???" }))
        .await;
    assert_eq!(missing_url.status_code(), 422);

    let created = app
        .server
        .post(&format!("/api/couples/{}/discoveries", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({
            "url": "https://example.com/song",
            "title": "Our song, maybe",
            "kind": "song"
        }))
        .await;
    assert_eq!(created.status_code(), 201);
    let discovery = created.json::<Value>();
    assert_eq!(discovery["kind"], "song");
    assert!(discovery["reaction"].is_null());

    let reacted = app
        .server
        .patch(&format!(
            "/api/discoveries/{}",
            discovery["id"].as_str().unwrap()
        ))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "reaction": "this is so us" }))
        .await
        .json::<Value>();
    assert_eq!(reacted["reaction"], "this is so us");
    assert_eq!(reacted["kind"], "song");
}

#[tokio::test]
async fn link_metadata_falls_back_to_the_bare_url() {
    let app = test_app();
    let user = Uuid::new_v4();

    let empty = app
        .server
        .post("/api/discoveries/metadata")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "url": "" }))
        .await;
    assert_eq!(empty.status_code(), 422);

    // No LLM configured: the share form still gets something usable.
    let meta = app
        .server
        .post("/api/discoveries/metadata")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "url": "https://example.com/a" }))
        .await
        .json::<Value>();
    assert_eq!(meta["title"], "https://example.com/a");
    assert_eq!(meta["kind"], "other");
}

#[tokio::test]
async fn uploads_are_stored_and_served_back() {
    let app = test_app();
    let user = Uuid::new_v4();

    let response = app
        .server
        .post("/api/uploads?filename=sunset.jpg")
        .add_header("x-user-id", user.to_string())
        .bytes(b"fake image bytes".as_slice().into())
        .await;
    assert_eq!(response.status_code(), 201);
    let url = response.json::<Value>()["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));

    let served = app.server.get(&url).await;
    assert_eq!(served.status_code(), 200);
    assert_eq!(served.as_bytes().as_ref(), b"fake image bytes");
}

#[tokio::test]
async fn scheduling_an_idea_returns_the_relocated_row() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let idea = app
        .server
        .post(&format!("/api/couples/{}/activities", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "title": "Stargazing", "category": "outdoors", "date": null }))
        .await
        .json::<Value>();
    assert!(idea["date"].is_null());

    let scheduled = app
        .server
        .patch(&format!("/api/activities/{}", idea["id"].as_str().unwrap()))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "date": "2030-06-01" }))
        .await
        .json::<Value>();
    assert_eq!(scheduled["date"], "2030-06-01");
}

#[tokio::test]
async fn date_ideas_always_answer_with_fallbacks() {
    let app = test_app();
    let user = Uuid::new_v4();
    let couple = create_couple(&app, user).await;

    let response = app
        .server
        .post(&format!("/api/couples/{}/date-ideas", couple.id))
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "interests": "cooking, astronomy" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let ideas = response.json::<Value>()["ideas"].as_array().unwrap().len();
    assert_eq!(ideas, 3);
}
