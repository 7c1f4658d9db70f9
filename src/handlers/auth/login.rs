use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::models::LoginRequest;
use crate::AppState;

/// POST /auth/login - authenticate and receive the token pair
pub async fn login_post(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state.auth.login(body).await?;

    Ok(Json(json!({ "success": true, "data": tokens })))
}
