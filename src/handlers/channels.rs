use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{ChannelCreate, ChannelUpdate};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /channels - list channels in name order
pub async fn channel_list(
    State(state): State<AppState>,
    Query(query): Query<ChannelListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let channels = state.channels.list(query.skip, query.limit).await?;
    let count = channels.len();

    Ok(Json(json!({ "success": true, "data": channels, "count": count })))
}

/// GET /channels/:id - show a single channel
pub async fn channel_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = state.channels.get(id).await?;

    Ok(Json(json!({ "success": true, "data": channel })))
}

/// POST /channels - create a channel owned by the caller
pub async fn channel_create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChannelCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = state
        .channels
        .create(body, Some(auth_user.user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": channel })),
    ))
}

/// PUT /channels/:id - merge the provided fields into the channel
pub async fn channel_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChannelUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = state.channels.update(id, body).await?;

    Ok(Json(json!({ "success": true, "data": channel })))
}

/// DELETE /channels/:id - remove a channel with no remaining videos
pub async fn channel_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.channels.delete(id).await?;

    Ok(Json(json!({ "success": true, "data": null })))
}
