// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenant_service::{RegisterRequest, Registration};

/// POST /auth/register - Create an account and its private schema
///
/// Expected Input:
/// ```json
/// { "username": "alice", "email": "alice@example.com", "password": "..." }
/// ```
///
/// Returns 201 with `{ token, user }`. Any failure after validation leaves no
/// account behind and reports a generic "Registration failed".
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Registration> {
    if !state.config.api.enable_registration {
        return Err(ApiError::forbidden("Registration is disabled"));
    }

    let registration = state.tenants().register(request).await?;
    Ok(ApiResponse::created(registration))
}
