#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use household_tasks::{
    config::TasksConfig,
    state::AppState,
    test_helpers::{test_app, test_state, test_state_with},
};

pub const PASSWORD: &str = "correct-horse-battery";

pub async fn app_state() -> Arc<AppState> {
    test_state().await.expect("build test state")
}

pub async fn app_state_with(tasks: TasksConfig) -> Arc<AppState> {
    test_state_with(tasks).await.expect("build test state")
}

pub async fn send(
    state: &Arc<AppState>,
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

    let response = test_app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers a user and returns `(token, user_id)`.
pub async fn register(state: &Arc<AppState>, email: &str) -> (String, String) {
    let (status, body) = send(
        state,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(state, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "profile failed: {me}");
    let user_id = me["data"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

pub async fn create_household(state: &Arc<AppState>, token: &str, name: &str) -> String {
    let (status, body) = send(
        state,
        "POST",
        "/api/v1/households",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "household failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn create_category(
    state: &Arc<AppState>,
    token: &str,
    name: &str,
    household_id: Option<&str>,
) -> String {
    let (status, body) = send(
        state,
        "POST",
        "/api/v1/categories",
        Some(token),
        Some(json!({ "name": name, "household_id": household_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "category failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn create_task(state: &Arc<AppState>, token: &str, payload: Value) -> Value {
    let (status, body) = send(state, "POST", "/api/v1/tasks", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "task failed: {body}");
    body["data"].clone()
}
