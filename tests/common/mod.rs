// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::{routing::post, Json, Router};
use cropdoc::config::Config;
use cropdoc::db::FirestoreDb;
use cropdoc::routes::create_router;
use cropdoc::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app over a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), FirestoreDb::new_in_memory())
}

/// Create a test app whose identification endpoint is `kindwise_endpoint`.
#[allow(dead_code)]
pub fn create_test_app_with_upstream(kindwise_endpoint: String) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.kindwise_endpoint = kindwise_endpoint;
    create_test_app_with(config, FirestoreDb::new_in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, db: FirestoreDb) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Identification response with one crop and one disease suggestion.
#[allow(dead_code)]
pub fn sample_identification() -> Value {
    json!({
        "access_token": "Ab12Cd34",
        "status": "COMPLETED",
        "result": {
            "is_plant": { "binary": true, "probability": 0.98 },
            "crop": { "suggestions": [
                { "id": "c1", "name": "tomato", "probability": 0.97, "scientific_name": "Solanum lycopersicum" },
                { "id": "c2", "name": "potato", "probability": 0.02 }
            ]},
            "disease": { "suggestions": [
                { "id": "d1", "name": "early blight", "probability": 0.81 },
                { "id": "d2", "name": "septoria leaf spot", "probability": 0.11 }
            ]}
        }
    })
}

/// Serve a fake identification API that always answers with `status` and `body`.
/// Returns the endpoint URL.
#[allow(dead_code)]
pub async fn spawn_fake_kindwise(status: u16, body: Value) -> String {
    spawn_counting_kindwise(status, body).await.0
}

/// Like `spawn_fake_kindwise`, also returning how many requests it has served.
#[allow(dead_code)]
pub async fn spawn_counting_kindwise(status: u16, body: Value) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/v1/identification",
        post(move || {
            let body = body.clone();
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                (
                    axum::http::StatusCode::from_u16(status).unwrap(),
                    Json(body),
                )
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/api/v1/identification", addr), hits)
}

/// POST a JSON body.
#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET, optionally with a bearer token.
#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and return `(token, user_id)`.
#[allow(dead_code)]
pub async fn register_user(app: &Router, username: &str, email: &str) -> (String, String) {
    let response = post_json(
        app,
        "/api/auth/register",
        json!({ "username": username, "email": email, "password": "secret123" }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[allow(dead_code)]
pub const BOUNDARY: &str = "----cropdoc-test-boundary";

/// One multipart part: `(field name, filename, content type, bytes)`.
#[allow(dead_code)]
pub type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

/// Build a multipart/form-data body.
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match filename {
            Some(f) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, f
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST a multipart upload to /api/diagnose.
#[allow(dead_code)]
pub async fn post_diagnose(app: &Router, token: Option<&str>, parts: &[Part<'_>]) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/diagnose")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(builder.body(Body::from(multipart_body(parts))).unwrap())
        .await
        .unwrap()
}
