#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use streamhub_api::config::AppConfig;
use streamhub_api::store::MemoryStore;
use streamhub_api::{router, AppState};

/// Build the full application router backed by the in-memory store
pub fn test_app() -> Router {
    let mut config = AppConfig::default();
    config.security.jwt_secret = "integration-test-secret".to_string();

    let store = Arc::new(MemoryStore::default());
    let state = AppState::new(config, store.clone(), store.clone(), store.clone(), store)
        .expect("failed to build app state");

    router(state)
}

/// Fire one request at the router and decode the JSON response
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json_body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Register a user and log in, returning the access token
pub async fn authenticate(app: &Router, username: &str) -> Result<String> {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": format!("{} Example", username),
            "password": "correct-horse"
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {}", status);

    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": "correct-horse" })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {}", status);

    Ok(body["data"]["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string())
}

/// Create a channel and return its id
pub async fn create_channel(app: &Router, token: &str, name: &str) -> Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/channels",
        Some(token),
        Some(json!({ "name": name, "category": "knowledge" })),
    )
    .await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "channel create failed: {} {}",
        status,
        body
    );

    Ok(body["data"]["id"]
        .as_str()
        .expect("channel id in response")
        .to_string())
}

/// Create a video under the given channel and return its id
pub async fn create_video(
    app: &Router,
    token: &str,
    channel_id: &str,
    youtube_id: &str,
) -> Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/videos",
        Some(token),
        Some(json!({
            "title": format!("Video {}", youtube_id),
            "youtube_id": youtube_id,
            "channel_id": channel_id,
            "duration_seconds": 60
        })),
    )
    .await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "video create failed: {} {}",
        status,
        body
    );

    Ok(body["data"]["id"]
        .as_str()
        .expect("video id in response")
        .to_string())
}
