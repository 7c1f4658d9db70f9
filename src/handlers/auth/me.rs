use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// GET /auth/me - current authenticated user
pub async fn me_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.user_by_id(auth_user.user_id).await?;

    Ok(Json(json!({ "success": true, "data": user })))
}
