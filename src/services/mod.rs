pub mod note_sync;
pub mod storage;
pub mod tenant_service;

pub use note_sync::{sync_files, sync_folders, NoteStore, PgNoteStore, SyncReport};
pub use storage::StorageLayout;
pub use tenant_service::{Registration, RegistryProvisioner, SchemaProvisioner, TenantError, TenantService};
