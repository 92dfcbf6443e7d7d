// handlers/protected/notes/folders.rs - /api/notes/folders handlers

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::identifier::LogicalTable;
use crate::database::query_builder::QueryBuilder;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::note_sync::sync_folders;
use crate::services::storage::is_plain_name;

use super::note_store;

#[derive(Debug, Deserialize)]
pub struct CreateFolder {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// GET /api/notes/folders - folder sync, then every folder ordered by path
pub async fn folders_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Value>> {
    let notes_root = state.storage.notes_root(&user.username);
    sync_folders(&note_store(&state, &user), user.id, &notes_root).await;

    let rows = QueryBuilder::new(&user.schema, LogicalTable::NoteFolders, user.id)
        .list(state.pool())
        .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/notes/folders - create the directory and its row
pub async fn folders_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateFolder>,
) -> ApiResult<Value> {
    let name = request.name.trim();
    if !is_plain_name(name) {
        return Err(ApiError::field_error("name", "Folder name must be a single path segment"));
    }

    let folders = QueryBuilder::new(&user.schema, LogicalTable::NoteFolders, user.id);
    let path = match request.parent_id {
        Some(parent_id) => {
            let parent = folders.find_by_id(state.pool(), parent_id).await?;
            let parent_path = parent
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError::internal_server_error("Folder record is incomplete"))?;
            format!("{}/{}", parent_path, name)
        }
        None => name.to_string(),
    };

    let dir = state
        .storage
        .folder_dir(&user.username, &path)
        .ok_or_else(|| ApiError::bad_request("Invalid folder path"))?;
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("Failed to create folder directory: {}", e);
        ApiError::internal_server_error("Failed to create folder")
    })?;

    let mut data = Map::new();
    data.insert("name".to_string(), json!(name));
    data.insert("path".to_string(), json!(path));
    data.insert("parent_id".to_string(), json!(request.parent_id));
    let row = folders.insert(state.pool(), &data).await?;
    Ok(ApiResponse::created(row))
}
