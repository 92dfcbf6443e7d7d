// handlers/protected/auth/account.rs - DELETE /api/auth/account handler

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /api/auth/account - Drop the caller's schema and account row
///
/// Uploaded files stay on disk; the username and email become available again.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    state.tenants().delete_account(user.id, &user.schema).await?;
    Ok(ApiResponse::success(json!({ "deleted": true, "id": user.id })))
}
