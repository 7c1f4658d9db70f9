use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::models::RegisterRequest;
use crate::AppState;

/// POST /auth/register - create a new user account
///
/// 201 with the created user (password hash excluded), 409 when the
/// username or email is already taken.
pub async fn register_post(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": user })),
    ))
}
