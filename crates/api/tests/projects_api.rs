//! End-to-end tests for the `/api/v1/projects` routes.
//!
//! Drives the full router (auth extractor, handlers, repositories)
//! against a real database. Covers ownership enforcement, validation,
//! pagination metadata, and the step update workflow.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use chantier_api::auth::jwt::{generate_access_token, JwtConfig};
use chantier_api::config::ServerConfig;
use chantier_api::routes;
use chantier_api::state::AppState;
use chantier_db::models::user::CreateUser;
use chantier_db::repositories::UserRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            jwt: JwtConfig {
                secret: "integration-test-secret".to_string(),
                access_token_expiry_mins: 15,
            },
        }),
    }
}

fn app(state: &AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .with_state(state.clone())
}

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            first_name: "Awa".to_string(),
            last_name: "Kone".to_string(),
            email: email.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn token_for(state: &AppState, user_id: i64) -> String {
    generate_access_token(user_id, &state.config.jwt).unwrap()
}

/// Send one request and return (status, parsed JSON body).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn project_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Construction d'une villa de 4 pieces",
        "location": {
            "address": "Rue des Jardins",
            "city": "Abidjan",
            "department": "Cocody"
        },
        "property_type": "villa",
        "construction_type": "neuf",
        "budget": { "estimated": 25000000 },
        "timeline": {
            "start_date": "2026-09-01T00:00:00Z",
            "end_date": "2027-03-01T00:00:00Z",
            "duration_days": 180
        }
    })
}

fn project_payload_with_steps(title: &str, step_count: i64) -> Value {
    let mut payload = project_payload(title);
    let steps: Vec<Value> = (1..=step_count)
        .map(|i| {
            json!({
                "step_id": i,
                "name": format!("Etape {i}"),
                "description": format!("Description etape {i}")
            })
        })
        .collect();
    payload["steps"] = Value::Array(steps);
    payload
}

async fn create_project(app: &Router, token: &str, payload: Value) -> i64 {
    let (status, body) = send(app, "POST", "/api/v1/projects", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requests_without_token_are_unauthorized(pool: PgPool) {
    let state = test_state(pool);
    let app = app(&state);

    let (status, body) = send(&app, "GET", "/api/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Create + get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_then_get_resolves_owner(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "awa@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload("Villa Duplex")).await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Villa Duplex");
    assert_eq!(body["data"]["status"], "planning");
    assert_eq!(body["data"]["progress_percentage"], 0);
    assert_eq!(body["data"]["owner"]["email"], "awa@example.test");
    assert!(body["data"]["architect"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_with_overlong_title_is_rejected_and_not_persisted(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "awa@example.test").await;
    let token = token_for(&state, owner);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/projects",
        Some(&token),
        Some(project_payload(&"t".repeat(101))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("title"));

    let (_, body) = send(&app, "GET", "/api/v1/projects", Some(&token), None).await;
    assert_eq!(body["data"]["total"], 0);
}

// ---------------------------------------------------------------------------
// Ownership guard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_owner_is_forbidden_everywhere(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let intruder = seed_user(&pool, "intruder@example.test").await;
    let owner_token = token_for(&state, owner);
    let intruder_token = token_for(&state, intruder);

    let id = create_project(&app, &owner_token, project_payload_with_steps("Privee", 2)).await;

    let attempts = [
        ("GET", format!("/api/v1/projects/{id}"), None),
        (
            "PUT",
            format!("/api/v1/projects/{id}"),
            Some(json!({"title": "Piratee"})),
        ),
        (
            "PUT",
            format!("/api/v1/projects/{id}/steps/1"),
            Some(json!({"status": "completed"})),
        ),
        ("DELETE", format!("/api/v1/projects/{id}"), None),
    ];

    for (method, uri, body) in attempts {
        let (status, response) = send(&app, method, &uri, Some(&intruder_token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}: {response}");
        assert_eq!(response["code"], "FORBIDDEN");
    }

    // The project is untouched for its owner.
    let (status, body) = send(&app, "GET", &format!("/api/v1/projects/{id}"), Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Privee");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_never_leaks_other_owners_projects(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let other = seed_user(&pool, "other@example.test").await;
    let owner_token = token_for(&state, owner);
    let other_token = token_for(&state, other);

    create_project(&app, &owner_token, project_payload("Projet A")).await;
    create_project(&app, &other_token, project_payload("Projet B")).await;

    let (_, body) = send(&app, "GET", "/api/v1/projects", Some(&owner_token), None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["projects"][0]["owner_id"], owner);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_pagination_metadata(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    for i in 0..15 {
        create_project(&app, &token, project_payload(&format!("Projet {i}"))).await;
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/projects?page=2&limit=10",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projects"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["current_page"], 2);
    assert_eq!(body["data"]["total"], 15);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_ignores_owner_reassignment(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let other = seed_user(&pool, "other@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload("Avant")).await;

    // owner_id is not in the update allow-list; it must be ignored.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/projects/{id}"),
        Some(&token),
        Some(json!({"title": "Apres", "owner_id": other})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Apres");
    assert_eq!(body["data"]["owner_id"], owner);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_project_is_not_found(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/projects/9999",
        Some(&token),
        Some(json!({"title": "Fantome"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Step updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_step_completion_drives_progress(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload_with_steps("Suivi", 4)).await;

    let complete = json!({"status": "completed"});
    let step_uri = |step: i64| format!("/api/v1/projects/{id}/steps/{step}");

    let (status, body) = send(&app, "PUT", &step_uri(1), Some(&token), Some(complete.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["step"]["status"], "completed");
    assert!(!body["data"]["step"]["end_date"].is_null());
    assert_eq!(body["data"]["progress"]["percentage"], 25);

    let (_, body) = send(&app, "PUT", &step_uri(2), Some(&token), Some(complete.clone())).await;
    assert_eq!(body["data"]["progress"]["percentage"], 50);

    let (_, body) = send(&app, "PUT", &step_uri(3), Some(&token), Some(complete.clone())).await;
    assert_eq!(body["data"]["progress"]["percentage"], 75);

    let (_, body) = send(&app, "PUT", &step_uri(4), Some(&token), Some(complete)).await;
    assert_eq!(body["data"]["progress"]["percentage"], 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_repeated_in_progress_keeps_first_start_date(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload_with_steps("Dates", 1)).await;
    let uri = format!("/api/v1/projects/{id}/steps/1");
    let start = json!({"status": "in_progress"});

    let (_, first) = send(&app, "PUT", &uri, Some(&token), Some(start.clone())).await;
    let first_start = first["data"]["step"]["start_date"].clone();
    assert!(!first_start.is_null());

    let (_, second) = send(&app, "PUT", &uri, Some(&token), Some(start)).await;
    assert_eq!(second["data"]["step"]["start_date"], first_start);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_step_update_partial_fields(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload_with_steps("Materiaux", 1)).await;
    let uri = format!("/api/v1/projects/{id}/steps/1");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({
            "materials": [
                {"name": "Ciment", "quantity": 50, "unit": "sacs", "cost": 325000}
            ],
            "notes": "Livraison prevue lundi"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["step"]["status"], "pending");
    assert_eq!(body["data"]["step"]["materials"][0]["name"], "Ciment");
    assert_eq!(body["data"]["step"]["notes"], "Livraison prevue lundi");
    assert!(body["data"]["step"]["start_date"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_step_is_not_found(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload_with_steps("Etapes", 2)).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/projects/{id}/steps/99"),
        Some(&token),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Step"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_step_status_is_rejected(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload_with_steps("Etapes", 1)).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/projects/{id}/steps/1"),
        Some(&token),
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_then_get_is_not_found(pool: PgPool) {
    let state = test_state(pool.clone());
    let app = app(&state);
    let owner = seed_user(&pool, "owner@example.test").await;
    let token = token_for(&state, owner);

    let id = create_project(&app, &token, project_payload("Ephemere")).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/api/v1/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/projects/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
