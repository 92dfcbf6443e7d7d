// handlers/protected/notes/mod.rs - notes folders and files
//
// Listings reconcile the user's notes directory first so entries dropped onto
// disk show up. Writes create the disk artifact and the row together.
pub mod files;
pub mod folders;

pub use files::{files_list, files_overwrite, files_upload};
pub use folders::{folders_create, folders_list};

use crate::app::AppState;
use crate::middleware::AuthUser;
use crate::services::note_sync::PgNoteStore;

fn note_store(state: &AppState, user: &AuthUser) -> PgNoteStore {
    PgNoteStore::new(state.pool().clone(), user.schema.clone())
}
