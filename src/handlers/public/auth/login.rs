// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenant_service::{LoginRequest, Registration};

/// POST /auth/login - Authenticate with username or email and receive a JWT
///
/// Expected Input:
/// ```json
/// { "login": "alice", "password": "..." }
/// ```
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> ApiResult<Registration> {
    let session = state.tenants().login(request).await?;
    Ok(ApiResponse::success(session))
}
