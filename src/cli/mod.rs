pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;

#[derive(Parser)]
#[command(name = "hubctl")]
#[command(about = "hubctl - operator commands for the Hub API database and data root")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Registered users and their schemas")]
    Tenants {
        #[command(subcommand)]
        cmd: commands::tenants::TenantCommands,
    },

    #[command(about = "Notes tree maintenance")]
    Notes {
        #[command(subcommand)]
        cmd: commands::notes::NotesCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Configuration and a database handle, as the server would build them.
pub struct CliContext {
    pub config: AppConfig,
    pub db: DatabaseManager,
}

impl CliContext {
    pub async fn connect() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let db = DatabaseManager::connect(&config.database).await?;
        Ok(Self { config, db })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let context = CliContext::connect().await?;

    let result = match cli.command {
        Commands::Tenants { cmd } => commands::tenants::handle(cmd, &context, output_format).await,
        Commands::Notes { cmd } => commands::notes::handle(cmd, &context, output_format).await,
    };

    context.db.close().await;
    result
}
