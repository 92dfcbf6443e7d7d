// handlers/protected/data/record.rs - /api/data/:table/:id record handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::query_builder::QueryBuilder;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::utils::{into_object, parse_id, reject_managed_columns, resolve_table};

/// GET /api/data/:table/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let id = parse_id(&id)?;

    let row = QueryBuilder::new(&user.schema, table, user.id)
        .find_by_id(state.pool(), id)
        .await?;
    Ok(ApiResponse::success(row))
}

/// PATCH /api/data/:table/:id - update only the supplied fields
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((table, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let id = parse_id(&id)?;
    let data = into_object(body)?;
    reject_managed_columns(table, &data)?;

    let row = QueryBuilder::new(&user.schema, table, user.id)
        .update(state.pool(), id, &data)
        .await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/data/:table/:id - returns the deleted row
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let id = parse_id(&id)?;

    let row = QueryBuilder::new(&user.schema, table, user.id)
        .delete(state.pool(), id)
        .await?;
    Ok(ApiResponse::success(row))
}
