// handlers/protected/preferences.rs - GET/PUT /api/preferences
//
// Preferences live in the global `user_preferences` table, one row per user.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::database::manager::DatabaseError;
use crate::database::models::UserPreferences;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct UpdatePreferences {
    pub ui_state: Value,
}

/// GET /api/preferences
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserPreferences> {
    let prefs: UserPreferences = sqlx::query_as(
        "SELECT user_id, ui_state, updated_at FROM user_preferences WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(state.pool())
    .await
    .map_err(DatabaseError::from)?;
    Ok(ApiResponse::success(prefs))
}

/// PUT /api/preferences - replace `ui_state` (an array of UI state entries)
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdatePreferences>,
) -> ApiResult<UserPreferences> {
    if !request.ui_state.is_array() {
        return Err(ApiError::field_error("ui_state", "ui_state must be an array"));
    }

    let prefs: UserPreferences = sqlx::query_as(
        "INSERT INTO user_preferences (user_id, ui_state, updated_at) VALUES ($1, $2::JSONB, NOW()) \
         ON CONFLICT (user_id) DO UPDATE SET ui_state = EXCLUDED.ui_state, updated_at = NOW() \
         RETURNING user_id, ui_state, updated_at",
    )
    .bind(user.id)
    .bind(request.ui_state.to_string())
    .fetch_one(state.pool())
    .await
    .map_err(DatabaseError::from)?;
    Ok(ApiResponse::success(prefs))
}
