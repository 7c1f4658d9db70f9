mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn list_starts_empty() -> Result<()> {
    let app = common::test_app();

    let (status, body) = common::send(&app, Method::GET, "/channels", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["data"].as_array().unwrap().is_empty());

    // Trailing-slash variant serves the same collection
    let (status, _) = common::send(&app, Method::GET, "/channels/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn writes_require_bearer_token() -> Result<()> {
    let app = common::test_app();

    let (status, _) = common::send(
        &app,
        Method::POST,
        "/channels",
        None,
        Some(json!({ "name": "Tech", "category": "knowledge" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn create_and_get_round_trip() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({
            "name": "Tech",
            "category": "knowledge",
            "description": "Technology talks"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Tech");
    assert!(body["data"]["owner_id"].is_string());

    let id = body["data"]["id"].as_str().unwrap();
    let (status, fetched) =
        common::send(&app, Method::GET, &format!("/channels/{}", id), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["description"], "Technology talks");
    Ok(())
}

#[tokio::test]
async fn unknown_category_fails_validation() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "Cooking", "category": "cooking" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("category").is_some());
    Ok(())
}

#[tokio::test]
async fn empty_name_fails_validation() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;

    let (status, _) = common::send(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "", "category": "knowledge" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn duplicate_name_is_conflict() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;
    common::create_channel(&app, &token, "Tech").await?;

    let (status, _) = common::send(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "Tech", "category": "gaming" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn update_merges_only_provided_fields() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;
    let id = common::create_channel(&app, &token, "Tech").await?;

    let (status, body) = common::send(
        &app,
        Method::PUT,
        &format!("/channels/{}", id),
        Some(&token),
        Some(json!({ "description": "Updated description" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Tech");
    assert_eq!(body["data"]["description"], "Updated description");
    Ok(())
}

#[tokio::test]
async fn update_missing_channel_is_not_found() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;

    let (status, _) = common::send(
        &app,
        Method::PUT,
        "/channels/00000000-0000-0000-0000-000000000000",
        Some(&token),
        Some(json!({ "name": "Ghost" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_then_get_is_not_found() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;
    let id = common::create_channel(&app, &token, "Tech").await?;

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/channels/{}", id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::send(&app, Method::GET, &format!("/channels/{}", id), None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_refused_while_channel_has_videos() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;
    let channel_id = common::create_channel(&app, &token, "Tech").await?;
    let video_id = common::create_video(&app, &token, &channel_id, "dQw4w9WgXcQ").await?;

    let (status, body) = common::send(
        &app,
        Method::DELETE,
        &format!("/channels/{}", channel_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Removing the video unblocks channel deletion
    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/videos/{}", video_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/channels/{}", channel_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn list_is_ordered_by_name() -> Result<()> {
    let app = common::test_app();
    let token = common::authenticate(&app, "alice").await?;
    common::create_channel(&app, &token, "Zulu").await?;
    common::create_channel(&app, &token, "Alpha").await?;
    common::create_channel(&app, &token, "Mike").await?;

    let (status, body) = common::send(&app, Method::GET, "/channels", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Mike", "Zulu"]);
    Ok(())
}
