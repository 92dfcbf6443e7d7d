use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::database::identifier::TenantSchema;
use crate::services::{sync_files, sync_folders, NoteStore, PgNoteStore, StorageLayout, TenantService};

#[derive(Subcommand)]
pub enum NotesCommands {
    #[command(about = "Reconcile a user's notes directory with the database")]
    Sync {
        #[arg(help = "Username")]
        username: String,
    },
}

pub async fn handle(cmd: NotesCommands, context: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        NotesCommands::Sync { username } => {
            let tenants = TenantService::new(context.db.pool().clone(), &context.config.security);
            let user = tenants
                .find_by_username(&username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;

            let schema = TenantSchema::parse(&user.schema_name)?;
            let store = PgNoteStore::new(context.db.pool().clone(), schema);
            let notes_root = StorageLayout::new(context.config.storage.data_root.clone()).notes_root(&user.username);

            let folders = sync_folders(&store, user.id, &notes_root).await;

            let mut files = vec![sync_files(&store, user.id, &notes_root, None).await];
            for folder_id in store.folder_ids(user.id).await?.into_values() {
                files.push(sync_files(&store, user.id, &notes_root, Some(folder_id)).await);
            }
            let inserted: usize = files.iter().map(|r| r.inserted).sum();
            let failed: usize = files.iter().map(|r| r.failed).sum();

            output_success(
                &output_format,
                &format!(
                    "Synced {}: {} folder(s) and {} file(s) added, {} failure(s)",
                    user.username,
                    folders.inserted,
                    inserted,
                    folders.failed + failed
                ),
                Some(json!({
                    "username": user.username,
                    "folders": folders,
                    "files": { "inserted": inserted, "failed": failed, "scopes": files.len() },
                })),
            )
        }
    }
}
