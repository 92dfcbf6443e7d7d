// handlers/protected/data/table.rs - /api/data/:table collection handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::identifier::LogicalTable;
use crate::database::query_builder::QueryBuilder;
use crate::database::topology::table_def;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::utils::{into_object, resolve_table, ListQuery};

/// GET /api/data/:table - list the caller's rows with optional filters
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(table): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Value>> {
    let table = resolve_table(&table)?;
    let filter = query.to_filter(table_def(table))?;

    let rows = QueryBuilder::new(&user.schema, table, user.id)
        .filter(filter)
        .list(state.pool())
        .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/data/:table - create a row owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    if matches!(table, LogicalTable::NoteFolders | LogicalTable::NoteFiles) {
        return Err(ApiError::bad_request(format!(
            "{} rows are created through /api/notes",
            table
        )));
    }
    let data = into_object(body)?;

    let row = QueryBuilder::new(&user.schema, table, user.id)
        .insert(state.pool(), &data)
        .await?;
    Ok(ApiResponse::created(row))
}
