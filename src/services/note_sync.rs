//! One-way reconciliation of a user's notes directory into `note_folders` and
//! `note_files`.
//!
//! Disk may be ahead of the database, never the reverse. A pass only ever
//! inserts rows for entries the database has not seen; it never deletes or
//! rewrites existing rows and never touches file content. Failures on single
//! entries are logged and skipped, so a pass always completes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::database::identifier::{LogicalTable, TenantSchema};
use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::types::FilterData;
use crate::services::storage::join_folder_path;

/// Fixed extension to MIME table for files the reconciler picks up.
const SUPPORTED_TYPES: [(&str, &str); 20] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("rtf", "application/rtf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("json", "application/json"),
];

/// MIME type for a supported extension (case-insensitive).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_TYPES.iter().find(|(e, _)| *e == ext).map(|(_, mime)| *mime)
}

/// MIME type for a file name, by its extension.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    Path::new(name).extension().and_then(|e| e.to_str()).and_then(mime_for_extension)
}

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub name: String,
    pub path: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub file_path: String,
    pub file_type: &'static str,
    pub file_size: i64,
}

/// Database side of the reconciler.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Every known folder path for the user, with its id.
    async fn folder_ids(&self, user_id: Uuid) -> Result<HashMap<String, Uuid>, DatabaseError>;

    /// Insert a folder row; `None` when another pass inserted the same path first.
    async fn insert_folder(&self, user_id: Uuid, folder: &NewFolder) -> Result<Option<Uuid>, DatabaseError>;

    async fn find_folder_id(&self, user_id: Uuid, path: &str) -> Result<Option<Uuid>, DatabaseError>;

    async fn folder_path(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<String>, DatabaseError>;

    /// Known `stored_name`s in one folder (`None` is the notes root).
    async fn stored_names(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<HashSet<String>, DatabaseError>;

    /// Insert a file row; `false` when the name was already taken in that folder.
    async fn insert_file(&self, user_id: Uuid, file: &NewFile) -> Result<bool, DatabaseError>;
}

/// Outcome of one pass, for logs and the operator CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub root_created: bool,
    pub scanned: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Fold directories under `notes_root` into `note_folders`.
pub async fn sync_folders(store: &dyn NoteStore, user_id: Uuid, notes_root: &Path) -> SyncReport {
    let mut report = SyncReport::default();

    if !notes_root.exists() {
        match tokio::fs::create_dir_all(notes_root).await {
            Ok(()) => report.root_created = true,
            Err(err) => {
                warn!(error = %err, "Failed to create notes root");
                report.failed += 1;
            }
        }
        return report;
    }

    let mut known = match store.folder_ids(user_id).await {
        Ok(known) => known,
        Err(err) => {
            warn!(error = %err, "Failed to load known folders");
            report.failed += 1;
            return report;
        }
    };

    let directories = match walk_directories(notes_root.to_path_buf()).await {
        Ok(directories) => directories,
        Err(err) => {
            warn!(error = %err, "Folder walk aborted");
            report.failed += 1;
            return report;
        }
    };

    for path in directories {
        report.scanned += 1;
        if known.contains_key(&path) {
            continue;
        }

        let (parent_id, name) = match path.rsplit_once('/') {
            Some((parent, name)) => match known.get(parent) {
                Some(id) => (Some(*id), name),
                None => {
                    warn!(path = %path, "Parent folder not synced, skipping");
                    report.failed += 1;
                    continue;
                }
            },
            None => (None, path.as_str()),
        };

        let folder = NewFolder { name: name.to_string(), path: path.clone(), parent_id };
        match store.insert_folder(user_id, &folder).await {
            Ok(Some(id)) => {
                known.insert(path, id);
                report.inserted += 1;
            }
            Ok(None) => match store.find_folder_id(user_id, &path).await {
                Ok(Some(id)) => {
                    known.insert(path, id);
                }
                Ok(None) => {
                    warn!(path = %path, "Folder insert conflicted but no row found");
                    report.failed += 1;
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "Failed to re-read folder");
                    report.failed += 1;
                }
            },
            Err(err) => {
                warn!(path = %path, error = %err, "Failed to insert folder");
                report.failed += 1;
            }
        }
    }

    debug!(?report, "Folder sync complete");
    report
}

/// Fold supported files directly inside one folder into `note_files`.
pub async fn sync_files(
    store: &dyn NoteStore,
    user_id: Uuid,
    notes_root: &Path,
    folder_id: Option<Uuid>,
) -> SyncReport {
    let mut report = SyncReport::default();

    let dir = match folder_id {
        None => notes_root.to_path_buf(),
        Some(id) => match store.folder_path(user_id, id).await {
            Ok(Some(path)) => match join_folder_path(notes_root, &path) {
                Some(dir) => dir,
                None => {
                    warn!(folder_id = %id, path = %path, "Folder path leaves the notes root, skipping");
                    report.failed += 1;
                    return report;
                }
            },
            Ok(None) => return report,
            Err(err) => {
                warn!(folder_id = %id, error = %err, "Failed to resolve folder");
                report.failed += 1;
                return report;
            }
        },
    };
    if !dir.is_dir() {
        return report;
    }

    let mut known = match store.stored_names(user_id, folder_id).await {
        Ok(known) => known,
        Err(err) => {
            warn!(error = %err, "Failed to load known files");
            report.failed += 1;
            return report;
        }
    };

    let entries = match list_files(notes_root.to_path_buf(), dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "Failed to list directory");
            report.failed += 1;
            return report;
        }
    };

    for entry in entries {
        report.scanned += 1;
        let listed = match entry {
            Ok(listed) => listed,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                report.failed += 1;
                continue;
            }
        };
        let file_type = match mime_for_name(&listed.name) {
            Some(mime) => mime,
            None => continue,
        };
        if known.contains(&listed.name) {
            continue;
        }

        let file = NewFile {
            folder_id,
            name: listed.name.clone(),
            file_path: listed.path.to_string_lossy().into_owned(),
            file_type,
            file_size: listed.size as i64,
        };
        match store.insert_file(user_id, &file).await {
            Ok(inserted) => {
                if inserted {
                    report.inserted += 1;
                }
                known.insert(listed.name);
            }
            Err(err) => {
                warn!(file = %listed.name, error = %err, "Failed to insert file");
                report.failed += 1;
            }
        }
    }

    debug!(?report, "File sync complete");
    report
}

/// Relative `/`-joined paths of every directory below `root`, parents first.
async fn walk_directories(root: PathBuf) -> Result<Vec<String>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let mut directories = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping entry due to walkdir error");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            match relative_path(&root, entry.path()) {
                Some(path) => directories.push(path),
                None => warn!(path = %entry.path().display(), "Skipping folder with non UTF-8 name"),
            }
        }
        directories
    })
    .await
}

struct ListedFile {
    name: String,
    path: PathBuf,
    size: u64,
}

/// Regular files directly inside `dir`, with absolute paths and sizes.
///
/// `dir` must resolve to a location under `root`; a symlinked folder pointing
/// elsewhere is refused.
async fn list_files(root: PathBuf, dir: PathBuf) -> Result<Vec<std::io::Result<ListedFile>>, std::io::Error> {
    tokio::task::spawn_blocking(move || {
        let root = std::fs::canonicalize(&root)?;
        let dir = std::fs::canonicalize(&dir)?;
        if !dir.starts_with(&root) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is outside the notes root", dir.display()),
            ));
        }
        let mut listed = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            listed.push(entry.and_then(|entry| {
                let metadata = entry.metadata()?;
                Ok((entry, metadata))
            }));
        }
        Ok(listed
            .into_iter()
            .filter_map(|result| match result {
                Ok((entry, metadata)) if metadata.is_file() => {
                    let name = entry.file_name().to_str()?.to_string();
                    Some(Ok(ListedFile { name, path: entry.path(), size: metadata.len() }))
                }
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            })
            .collect())
    })
    .await
    .map_err(std::io::Error::other)?
}

/// `/`-joined path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    let segments = segments?;
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// `NoteStore` over a tenant schema.
pub struct PgNoteStore {
    pool: PgPool,
    schema: TenantSchema,
}

impl PgNoteStore {
    pub fn new(pool: PgPool, schema: TenantSchema) -> Self {
        Self { pool, schema }
    }

    fn folders(&self, user_id: Uuid) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema, LogicalTable::NoteFolders, user_id)
    }

    fn files(&self, user_id: Uuid) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema, LogicalTable::NoteFiles, user_id)
    }
}

fn row_uuid(row: &Value, column: &str) -> Option<Uuid> {
    row.get(column).and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
}

fn row_str<'v>(row: &'v Value, column: &str) -> Option<&'v str> {
    row.get(column).and_then(Value::as_str)
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn folder_ids(&self, user_id: Uuid) -> Result<HashMap<String, Uuid>, DatabaseError> {
        let rows = self.folders(user_id).list(&self.pool).await?;
        Ok(rows
            .iter()
            .filter_map(|row| Some((row_str(row, "path")?.to_string(), row_uuid(row, "id")?)))
            .collect())
    }

    async fn insert_folder(&self, user_id: Uuid, folder: &NewFolder) -> Result<Option<Uuid>, DatabaseError> {
        let mut data = Map::new();
        data.insert("name".to_string(), json!(folder.name));
        data.insert("path".to_string(), json!(folder.path));
        data.insert("parent_id".to_string(), json!(folder.parent_id));
        let row = self.folders(user_id).insert_if_absent(&self.pool, &data).await?;
        Ok(row.as_ref().and_then(|row| row_uuid(row, "id")))
    }

    async fn find_folder_id(&self, user_id: Uuid, path: &str) -> Result<Option<Uuid>, DatabaseError> {
        let rows = self
            .folders(user_id)
            .filter(FilterData::new().eq("path", path).page(Some(1), None))
            .list(&self.pool)
            .await?;
        Ok(rows.first().and_then(|row| row_uuid(row, "id")))
    }

    async fn folder_path(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<String>, DatabaseError> {
        match self.folders(user_id).find_by_id(&self.pool, folder_id).await {
            Ok(row) => Ok(row_str(&row, "path").map(str::to_string)),
            Err(DatabaseError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn stored_names(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<HashSet<String>, DatabaseError> {
        let filter = match folder_id {
            Some(id) => FilterData::new().eq("folder_id", id.to_string()),
            None => FilterData::new().is_null("folder_id"),
        };
        let rows = self.files(user_id).filter(filter).list(&self.pool).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row_str(row, "stored_name").map(str::to_string))
            .collect())
    }

    async fn insert_file(&self, user_id: Uuid, file: &NewFile) -> Result<bool, DatabaseError> {
        let mut data = Map::new();
        data.insert("folder_id".to_string(), json!(file.folder_id));
        data.insert("filename".to_string(), json!(file.name));
        data.insert("stored_name".to_string(), json!(file.name));
        data.insert("file_path".to_string(), json!(file.file_path));
        data.insert("file_type".to_string(), json!(file.file_type));
        data.insert("file_size".to_string(), json!(file.file_size));
        let row = self.files(user_id).insert_if_absent(&self.pool, &data).await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        folders: Mutex<Vec<(Uuid, NewFolder)>>,
        files: Mutex<Vec<NewFile>>,
    }

    #[async_trait]
    impl NoteStore for MemoryStore {
        async fn folder_ids(&self, _user_id: Uuid) -> Result<HashMap<String, Uuid>, DatabaseError> {
            Ok(self.folders.lock().unwrap().iter().map(|(id, f)| (f.path.clone(), *id)).collect())
        }

        async fn insert_folder(&self, _user_id: Uuid, folder: &NewFolder) -> Result<Option<Uuid>, DatabaseError> {
            let mut folders = self.folders.lock().unwrap();
            if folders.iter().any(|(_, f)| f.path == folder.path) {
                return Ok(None);
            }
            let id = Uuid::new_v4();
            folders.push((id, folder.clone()));
            Ok(Some(id))
        }

        async fn find_folder_id(&self, _user_id: Uuid, path: &str) -> Result<Option<Uuid>, DatabaseError> {
            Ok(self.folders.lock().unwrap().iter().find(|(_, f)| f.path == path).map(|(id, _)| *id))
        }

        async fn folder_path(&self, _user_id: Uuid, folder_id: Uuid) -> Result<Option<String>, DatabaseError> {
            Ok(self.folders.lock().unwrap().iter().find(|(id, _)| *id == folder_id).map(|(_, f)| f.path.clone()))
        }

        async fn stored_names(&self, _user_id: Uuid, folder_id: Option<Uuid>) -> Result<HashSet<String>, DatabaseError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|f| f.folder_id == folder_id)
                .map(|f| f.name.clone())
                .collect())
        }

        async fn insert_file(&self, _user_id: Uuid, file: &NewFile) -> Result<bool, DatabaseError> {
            let mut files = self.files.lock().unwrap();
            if files.iter().any(|f| f.folder_id == file.folder_id && f.name == file.name) {
                return Ok(false);
            }
            files.push(file.clone());
            Ok(true)
        }
    }

    /// Store that already holds a folder row the walk does not know about.
    struct RacingStore {
        inner: MemoryStore,
        winner: Uuid,
    }

    #[async_trait]
    impl NoteStore for RacingStore {
        async fn folder_ids(&self, user_id: Uuid) -> Result<HashMap<String, Uuid>, DatabaseError> {
            self.inner.folder_ids(user_id).await
        }
        async fn insert_folder(&self, _user_id: Uuid, _folder: &NewFolder) -> Result<Option<Uuid>, DatabaseError> {
            Ok(None)
        }
        async fn find_folder_id(&self, _user_id: Uuid, _path: &str) -> Result<Option<Uuid>, DatabaseError> {
            Ok(Some(self.winner))
        }
        async fn folder_path(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<String>, DatabaseError> {
            self.inner.folder_path(user_id, folder_id).await
        }
        async fn stored_names(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<HashSet<String>, DatabaseError> {
            self.inner.stored_names(user_id, folder_id).await
        }
        async fn insert_file(&self, user_id: Uuid, file: &NewFile) -> Result<bool, DatabaseError> {
            self.inner.insert_file(user_id, file).await
        }
    }

    fn folder(store: &MemoryStore, path: &str) -> (Uuid, NewFolder) {
        store
            .folders
            .lock()
            .unwrap()
            .iter()
            .find(|(_, f)| f.path == path)
            .cloned()
            .unwrap()
    }

    #[test]
    fn maps_supported_extensions() {
        assert_eq!(mime_for_extension("txt"), Some("text/plain"));
        assert_eq!(mime_for_extension("PDF"), Some("application/pdf"));
        assert_eq!(mime_for_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("exe"), None);
        assert_eq!(mime_for_name("notes.txt"), Some("text/plain"));
        assert_eq!(mime_for_name("Makefile"), None);
    }

    #[test]
    fn joins_relative_paths_with_slashes() {
        let root = Path::new("/data/alice/notes");
        assert_eq!(
            relative_path(root, &root.join("School").join("Math")),
            Some("School/Math".to_string())
        );
        assert_eq!(relative_path(root, root), None);
        assert_eq!(relative_path(root, Path::new("/elsewhere")), None);
    }

    #[tokio::test]
    async fn missing_root_is_created_and_ends_the_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("alice").join("notes");
        let store = MemoryStore::default();

        let report = sync_folders(&store, Uuid::new_v4(), &root).await;

        assert!(report.root_created);
        assert!(root.is_dir());
        assert!(store.folders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn syncs_nested_folders_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("notes");
        std::fs::create_dir_all(root.join("School").join("Math")).unwrap();
        std::fs::write(root.join("School").join("Math").join("notes.txt"), b"0123456789").unwrap();
        let store = MemoryStore::default();
        let user = Uuid::new_v4();

        let report = sync_folders(&store, user, &root).await;
        assert_eq!(report.inserted, 2);

        let (school_id, school) = folder(&store, "School");
        assert_eq!(school.name, "School");
        assert_eq!(school.parent_id, None);
        let (math_id, math) = folder(&store, "School/Math");
        assert_eq!(math.name, "Math");
        assert_eq!(math.parent_id, Some(school_id));

        let report = sync_files(&store, user, &root, Some(math_id)).await;
        assert_eq!(report.inserted, 1);
        let files = store.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "notes.txt");
        assert_eq!(files[0].file_size, 10);
        assert_eq!(files[0].file_type, "text/plain");
        assert_eq!(files[0].folder_id, Some(math_id));
        assert!(Path::new(&files[0].file_path).is_absolute());
    }

    #[tokio::test]
    async fn second_pass_inserts_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("notes");
        std::fs::create_dir_all(root.join("a").join("b").join("c")).unwrap();
        std::fs::create_dir_all(root.join("d")).unwrap();
        std::fs::write(root.join("todo.md"), b"# hi").unwrap();
        let store = MemoryStore::default();
        let user = Uuid::new_v4();

        assert_eq!(sync_folders(&store, user, &root).await.inserted, 4);
        assert_eq!(sync_files(&store, user, &root, None).await.inserted, 1);

        assert_eq!(sync_folders(&store, user, &root).await.inserted, 0);
        assert_eq!(sync_files(&store, user, &root, None).await.inserted, 0);
        assert_eq!(store.folders.lock().unwrap().len(), 4);
        assert_eq!(store.files.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn skips_unsupported_files_and_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("notes");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("virus.exe"), b"MZ").unwrap();
        std::fs::write(root.join("README"), b"x").unwrap();
        std::fs::write(root.join("sub").join("deep.txt"), b"x").unwrap();
        std::fs::write(root.join("photo.PNG"), b"png").unwrap();
        let store = MemoryStore::default();

        for _ in 0..2 {
            sync_files(&store, Uuid::new_v4(), &root, None).await;
        }

        let files = store.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "photo.PNG");
        assert_eq!(files[0].file_type, "image/png");
    }

    #[tokio::test]
    async fn unknown_folder_scope_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();
        let report = sync_files(&store, Uuid::new_v4(), tmp.path(), Some(Uuid::new_v4())).await;
        assert_eq!(report, SyncReport::default());
    }

    #[tokio::test]
    async fn lost_race_uses_the_winning_row() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("notes");
        std::fs::create_dir_all(root.join("Work").join("2024")).unwrap();
        let winner = Uuid::new_v4();
        let store = RacingStore { inner: MemoryStore::default(), winner };

        let report = sync_folders(&store, Uuid::new_v4(), &root).await;

        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.scanned, 2);
    }

    fn store_with_folder(path: &str) -> (MemoryStore, Uuid) {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();
        store.folders.lock().unwrap().push((
            id,
            NewFolder { name: "x".to_string(), path: path.to_string(), parent_id: None },
        ));
        (store, id)
    }

    #[tokio::test]
    async fn folder_path_with_parent_segments_is_not_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("mallory").join("notes");
        let secret = tmp.path().join("bob").join("notes").join("Secret");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&secret).unwrap();
        std::fs::write(secret.join("bank-passwords.txt"), b"hunter2").unwrap();

        let (store, id) = store_with_folder("../../bob/notes/Secret");
        let report = sync_files(&store, Uuid::new_v4(), &root, Some(id)).await;

        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 1);
        assert!(store.files.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_folder_outside_the_root_is_not_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("mallory").join("notes");
        let secret = tmp.path().join("bob").join("notes").join("Secret");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&secret).unwrap();
        std::fs::write(secret.join("bank-passwords.txt"), b"hunter2").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("Linked")).unwrap();

        let (store, id) = store_with_folder("Linked");
        let report = sync_files(&store, Uuid::new_v4(), &root, Some(id)).await;

        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 1);
        assert!(store.files.lock().unwrap().is_empty());
    }
}
