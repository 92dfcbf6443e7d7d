use std::path::{Path, PathBuf};

/// On-disk layout of every user's files under the data root:
///
/// ```text
/// <data_root>/<username>/notes/<folder path>/...
/// <data_root>/<username>/uploads/...
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    data_root: PathBuf,
}

impl StorageLayout {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into() }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn user_root(&self, username: &str) -> PathBuf {
        self.data_root.join(username)
    }

    pub fn notes_root(&self, username: &str) -> PathBuf {
        self.user_root(username).join("notes")
    }

    pub fn uploads_root(&self, username: &str) -> PathBuf {
        self.user_root(username).join("uploads")
    }

    /// Directory for a `/`-joined folder path, or None if any segment is not
    /// a plain name.
    pub fn folder_dir(&self, username: &str, folder_path: &str) -> Option<PathBuf> {
        join_folder_path(&self.notes_root(username), folder_path)
    }
}

/// `notes_root` joined with every segment of `folder_path`. Any segment that
/// could leave the notes root yields None.
pub fn join_folder_path(notes_root: &Path, folder_path: &str) -> Option<PathBuf> {
    let mut dir = notes_root.to_path_buf();
    for segment in folder_path.split('/') {
        if !is_plain_name(segment) {
            return None;
        }
        dir.push(segment);
    }
    Some(dir)
}

/// A single path segment that cannot escape its parent directory.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_user_directories() {
        let layout = StorageLayout::new("/data");
        assert_eq!(layout.notes_root("alice"), PathBuf::from("/data/alice/notes"));
        assert_eq!(layout.uploads_root("alice"), PathBuf::from("/data/alice/uploads"));
        assert_eq!(
            layout.folder_dir("alice", "School/Math"),
            Some(PathBuf::from("/data/alice/notes/School/Math"))
        );
    }

    #[test]
    fn folder_dir_refuses_traversal() {
        let layout = StorageLayout::new("/data");
        assert_eq!(layout.folder_dir("alice", "../bob"), None);
        assert_eq!(layout.folder_dir("alice", "School//Math"), None);
        assert_eq!(layout.folder_dir("alice", ""), None);
        assert!(!is_plain_name("a\\b"));
        assert!(is_plain_name(".hidden"));
    }
}
