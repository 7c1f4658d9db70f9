use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::models::RefreshRequest;
use crate::AppState;

/// POST /auth/refresh - exchange a refresh token for a new access token
pub async fn refresh_post(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state.auth.refresh(&body.refresh_token).await?;

    Ok(Json(json!({ "success": true, "data": tokens })))
}
