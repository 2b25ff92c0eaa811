//! End-to-end scenarios against a real Postgres instance.
//!
//! These tests are ignored by default; point DATABASE_URL at a disposable
//! database and run `cargo test -- --ignored` to exercise them.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use promptbank::{
    ai::{client::GenerationClient, models::Model},
    app::build_app,
    auth::jwt::JwtKeys,
    config::{AiConfig, AppConfig, CorsConfig, JwtConfig},
    state::AppState,
    users::repo::User,
};

const STUB_TEXT: &str = "Это сгенерированный текст сочинения для проверки списания баланса.";

struct StubGeneration;

#[async_trait]
impl GenerationClient for StubGeneration {
    async fn generate(
        &self,
        _request: &str,
        _model: Model,
        _system_text: Option<&str>,
    ) -> Result<String> {
        Ok(STUB_TEXT.to_string())
    }
}

async fn test_state() -> AppState {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("apply migrations");

    let config = Arc::new(AppConfig {
        database_url: url,
        jwt: JwtConfig {
            private_key_path: "tests/fixtures/private.pem".into(),
            public_key_path: "tests/fixtures/public.pem".into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        ai: AiConfig {
            api_key: "test".into(),
            base_url: "https://api.openai.com/v1".into(),
            proxy: None,
            essay_system_text: "system".into(),
            min_tokens_for_ai: 500,
            min_tokens_for_essay: 750,
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".into()],
        },
    });
    let jwt = JwtKeys::from_pems(
        include_bytes!("fixtures/private.pem"),
        include_bytes!("fixtures/public.pem"),
        5,
        60,
    )
    .expect("fixture keys should load");

    AppState::from_parts(db, config, jwt, Arc::new(StubGeneration))
}

/// Unique-per-run username within the 4-15 character limit.
fn fresh_username() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("u{:014}", nanos % 100_000_000_000_000)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json_with_bearer(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register/",
            json!({"username": username, "email": email, "password": password}),
        ))
        .await
        .unwrap();
    response.status()
}

async fn login(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(post_json("/api/users/login/", body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn tokens_count(app: &Router, access: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/users/me/tokens/", access))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["tokens_count"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn register_login_ask_debits_balance() {
    let state = test_state().await;
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);

    let (status, body) = login(&app, json!({"username": username, "password": "12345"})).await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();
    assert!(body["refresh_token"].as_str().is_some());

    assert_eq!(tokens_count(&app, &access).await, 1500);

    let response = app
        .clone()
        .oneshot(post_json_with_bearer(
            "/api/ai/ask/",
            &access,
            json!({"text": "Hi", "model": "gpt-4o-mini"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let cost = body["tokens"].as_i64().unwrap();
    assert!(cost > 0);
    assert_eq!(body["text"], STUB_TEXT);

    assert_eq!(tokens_count(&app, &access).await, 1500 - cost);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn duplicate_username_or_email_conflicts() {
    let state = test_state().await;
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);

    // Same username, different email.
    let other_email = format!("x{username}@example.ru");
    assert_eq!(
        register(&app, &username, &other_email, "12345").await,
        StatusCode::BAD_REQUEST
    );

    // Same email, different username.
    let other_username = fresh_username();
    assert_eq!(
        register(&app, &other_username, &email, "12345").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn login_via_username_and_email_are_equivalent() {
    let state = test_state().await;
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);

    let (status, by_username) =
        login(&app, json!({"username": username, "password": "12345"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, by_email) = login(&app, json!({"email": email, "password": "12345"})).await;
    assert_eq!(status, StatusCode::OK);

    assert!(by_username["access_token"].as_str().is_some());
    assert!(by_email["access_token"].as_str().is_some());
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let state = test_state().await;
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);

    let (wrong_status, wrong_body) =
        login(&app, json!({"username": username, "password": "nope"})).await;
    let (unknown_status, unknown_body) =
        login(&app, json!({"username": "nobody99", "password": "12345"})).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn essay_below_threshold_leaves_balance_unchanged() {
    let state = test_state().await;
    let db = state.db.clone();
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);
    let (_, body) = login(&app, json!({"username": username, "password": "12345"})).await;
    let access = body["access_token"].as_str().unwrap().to_string();

    // Drop the balance below the essay threshold (750) but above ask's (500).
    let user = User::find_by_username(&db, &username).await.unwrap().unwrap();
    let balance = User::debit(&db, user.id, 900).await.unwrap().unwrap();
    assert_eq!(balance, 600);

    let response = app
        .clone()
        .oneshot(post_json_with_bearer(
            "/api/ai/compose/essay/",
            &access,
            json!({
                "theme": "Трагизм Мцыри",
                "author": "Н. Ю. Лермонтов",
                "word_count": 1,
                "additional_info": "Трагический герой",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "insufficient_balance");

    assert_eq!(tokens_count(&app, &access).await, 600);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn concurrent_asks_settle_to_exact_balance() {
    let state = test_state().await;
    let app = build_app(state);

    let username = fresh_username();
    let email = format!("{username}@example.ru");
    assert_eq!(register(&app, &username, &email, "12345").await, StatusCode::CREATED);
    let (_, body) = login(&app, json!({"username": username, "password": "12345"})).await;
    let access = body["access_token"].as_str().unwrap().to_string();

    const CONCURRENCY: usize = 10;
    let mut joins = tokio::task::JoinSet::new();
    for _ in 0..CONCURRENCY {
        let app = app.clone();
        let access = access.clone();
        joins.spawn(async move {
            let response = app
                .oneshot(post_json_with_bearer(
                    "/api/ai/ask/",
                    &access,
                    json!({"text": "Hi", "model": "gpt-4o-mini"}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await["tokens"].as_i64().unwrap()
        });
    }

    let mut total_cost = 0;
    while let Some(cost) = joins.join_next().await {
        total_cost += cost.unwrap();
    }

    // The atomic debit must account for every concurrent request exactly.
    assert_eq!(tokens_count(&app, &access).await, 1500 - total_cost);
}
