use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{VideoCreate, VideoListQuery, VideoUpdate};
use crate::AppState;

/// GET /videos - list videos, newest first, with optional filters
pub async fn video_list(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let videos = state.videos.list(query).await?;
    let count = videos.len();

    Ok(Json(json!({ "success": true, "data": videos, "count": count })))
}

/// GET /videos/:id - show a single video
pub async fn video_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.videos.get(id).await?;

    Ok(Json(json!({ "success": true, "data": video })))
}

/// GET /videos/youtube/:youtube_id - lookup by YouTube id
pub async fn video_get_by_youtube_id(
    State(state): State<AppState>,
    Path(youtube_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.videos.get_by_youtube_id(&youtube_id).await?;

    Ok(Json(json!({ "success": true, "data": video })))
}

/// POST /videos - create a video under an existing channel
pub async fn video_create(
    State(state): State<AppState>,
    Json(body): Json<VideoCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.videos.create(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": video })),
    ))
}

/// PUT /videos/:id - merge the provided fields into the video
pub async fn video_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<VideoUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.videos.update(id, body).await?;

    Ok(Json(json!({ "success": true, "data": video })))
}

/// DELETE /videos/:id - remove a video
pub async fn video_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.videos.delete(id).await?;

    Ok(Json(json!({ "success": true, "data": null })))
}

/// POST /videos/:id/view - atomically bump the view counter
pub async fn video_increment_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.videos.increment_view(id).await?;

    Ok(Json(json!({ "success": true, "data": video })))
}
