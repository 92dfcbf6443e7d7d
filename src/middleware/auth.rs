use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims};
use crate::database::identifier::TenantSchema;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
///
/// The schema comes from the signed claim and is never re-fetched per request.
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub schema: TenantSchema,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let schema = TenantSchema::parse(&claims.schema).map_err(|e| {
            tracing::warn!("Rejected token with invalid schema claim: {}", e);
            ApiError::unauthorized("Invalid JWT token")
        })?;
        Ok(Self { id: claims.sub, username: claims.username, schema })
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret).map_err(|e| {
        tracing::debug!("JWT validation failed: {}", e);
        ApiError::unauthorized("Invalid JWT token")
    })?;

    let auth_user = AuthUser::try_from(claims)?;
    if !state.tenants().is_active(auth_user.id).await? {
        tracing::debug!("Rejected token for deleted account {}", auth_user.id);
        return Err(ApiError::unauthorized("Account no longer exists"));
    }
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
