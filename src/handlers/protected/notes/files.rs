// handlers/protected/notes/files.rs - /api/notes/files handlers

use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::identifier::LogicalTable;
use crate::database::query_builder::QueryBuilder;
use crate::error::ApiError;
use crate::filter::types::FilterData;
use crate::handlers::protected::data::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::note_sync::{mime_for_name, sync_files};
use crate::services::storage::is_plain_name;

use super::note_store;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub folder_id: Option<Uuid>,
}

/// GET /api/notes/files?folder_id= - file sync for that folder, then its files
pub async fn files_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FilesQuery>,
) -> ApiResult<Vec<Value>> {
    if let Some(folder_id) = query.folder_id {
        QueryBuilder::new(&user.schema, LogicalTable::NoteFolders, user.id)
            .find_by_id(state.pool(), folder_id)
            .await?;
    }

    let notes_root = state.storage.notes_root(&user.username);
    sync_files(&note_store(&state, &user), user.id, &notes_root, query.folder_id).await;

    let filter = match query.folder_id {
        Some(id) => FilterData::new().eq("folder_id", id.to_string()),
        None => FilterData::new().is_null("folder_id"),
    };
    let rows = QueryBuilder::new(&user.schema, LogicalTable::NoteFiles, user.id)
        .filter(filter)
        .list(state.pool())
        .await?;
    Ok(ApiResponse::success(rows))
}

/// Parts of an upload or overwrite form.
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Option<Vec<u8>>,
    folder_id: Option<String>,
    annotations: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                form.bytes = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            Some("folder_id") => form.folder_id = Some(field.text().await.map_err(multipart_error)?),
            Some("annotations") => form.annotations = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }
    Ok(form)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the size limit")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// POST /api/notes/files - multipart `file` plus optional `folder_id`
///
/// Bytes are written first, then the row. If the row cannot be inserted the
/// bytes are removed again.
pub async fn files_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = read_form(multipart).await?;
    let bytes = form.bytes.ok_or_else(|| ApiError::field_error("file", "File is required"))?;
    let original = form
        .file_name
        .as_deref()
        .and_then(|name| FsPath::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| is_plain_name(name))
        .ok_or_else(|| ApiError::field_error("file", "File name is missing or invalid"))?
        .to_string();

    let folder_id = match form.folder_id.as_deref().map(str::trim) {
        None | Some("") | Some("root") => None,
        Some(id) => Some(parse_id(id)?),
    };

    let dir = match folder_id {
        Some(id) => {
            let folder = QueryBuilder::new(&user.schema, LogicalTable::NoteFolders, user.id)
                .find_by_id(state.pool(), id)
                .await?;
            let path = folder.get("path").and_then(Value::as_str).unwrap_or_default();
            state
                .storage
                .folder_dir(&user.username, path)
                .ok_or_else(|| ApiError::internal_server_error("Folder record is incomplete"))?
        }
        None => state.storage.uploads_root(&user.username),
    };

    tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
    let stored_name = free_name(&dir, &original).await;
    let target = dir.join(&stored_name);
    tokio::fs::write(&target, &bytes).await.map_err(storage_error)?;
    let file_path = tokio::fs::canonicalize(&target).await.map_err(storage_error)?;

    let file_type = mime_for_name(&original)
        .map(str::to_string)
        .or(form.content_type)
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let mut data = Map::new();
    data.insert("folder_id".to_string(), json!(folder_id));
    data.insert("filename".to_string(), json!(original));
    data.insert("stored_name".to_string(), json!(stored_name));
    data.insert("file_path".to_string(), json!(file_path.to_string_lossy()));
    data.insert("file_type".to_string(), json!(file_type));
    data.insert("file_size".to_string(), json!(bytes.len() as i64));

    match QueryBuilder::new(&user.schema, LogicalTable::NoteFiles, user.id)
        .insert(state.pool(), &data)
        .await
    {
        Ok(row) => Ok(ApiResponse::created(row)),
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                tracing::warn!(error = %e, "Failed to remove orphaned upload");
            }
            Err(err.into())
        }
    }
}

/// PUT /api/notes/files/:id/content - replace the bytes of an existing file
///
/// The row keeps its id; `file_size`, `annotations` and `updated_at` change.
pub async fn files_overwrite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let form = read_form(multipart).await?;
    let bytes = form.bytes.ok_or_else(|| ApiError::field_error("file", "File is required"))?;
    let annotations = match form.annotations {
        Some(raw) => Some(
            serde_json::from_str::<Value>(&raw)
                .map_err(|_| ApiError::field_error("annotations", "Annotations must be valid JSON"))?,
        ),
        None => None,
    };

    let files = QueryBuilder::new(&user.schema, LogicalTable::NoteFiles, user.id);
    let row = files.find_by_id(state.pool(), id).await?;
    let file_path = row
        .get("file_path")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| ApiError::internal_server_error("File record is incomplete"))?;

    let target = contained_path(&state.storage.user_root(&user.username), &file_path)
        .await
        .ok_or_else(|| ApiError::not_found("File content not found"))?;

    let staging = target.with_extension(format!("upload-{}", Uuid::new_v4().simple()));
    tokio::fs::write(&staging, &bytes).await.map_err(storage_error)?;
    if let Err(e) = tokio::fs::rename(&staging, &target).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(storage_error(e));
    }

    let mut data = Map::new();
    data.insert("file_size".to_string(), json!(bytes.len() as i64));
    if let Some(annotations) = annotations {
        data.insert("annotations".to_string(), annotations);
    }
    let updated = files.update(state.pool(), id, &data).await?;
    Ok(ApiResponse::success(updated))
}

/// `path` resolved, provided it exists and lies under `root`.
async fn contained_path(root: &FsPath, path: &FsPath) -> Option<PathBuf> {
    let root = tokio::fs::canonicalize(root).await.ok()?;
    let resolved = tokio::fs::canonicalize(path).await.ok()?;
    resolved.starts_with(&root).then_some(resolved)
}

/// `name` if nothing exists at `dir/name`, else `<uuid>-name`.
async fn free_name(dir: &FsPath, name: &str) -> String {
    match tokio::fs::try_exists(dir.join(name)).await {
        Ok(false) => name.to_string(),
        _ => format!("{}-{}", Uuid::new_v4().simple(), name),
    }
}

fn storage_error(err: std::io::Error) -> ApiError {
    tracing::error!("File storage error: {}", err);
    ApiError::internal_server_error("Failed to store file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn colliding_names_get_a_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(free_name(tmp.path(), "essay.md").await, "essay.md");

        std::fs::write(tmp.path().join("essay.md"), b"x").unwrap();
        let renamed = free_name(tmp.path(), "essay.md").await;
        assert!(renamed.ends_with("-essay.md"));
        assert_ne!(renamed, "essay.md");
    }

    #[tokio::test]
    async fn paths_outside_the_user_root_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let alice = tmp.path().join("alice");
        let bob = tmp.path().join("bob");
        std::fs::create_dir_all(&alice).unwrap();
        std::fs::create_dir_all(&bob).unwrap();
        std::fs::write(alice.join("mine.txt"), b"a").unwrap();
        std::fs::write(bob.join("theirs.txt"), b"b").unwrap();

        assert!(contained_path(&alice, &alice.join("mine.txt")).await.is_some());
        assert!(contained_path(&alice, &bob.join("theirs.txt")).await.is_none());
        assert!(contained_path(&alice, &alice.join("..").join("bob").join("theirs.txt")).await.is_none());
        assert!(contained_path(&alice, &alice.join("missing.txt")).await.is_none());
    }
}
