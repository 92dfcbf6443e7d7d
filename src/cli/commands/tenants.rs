use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::database::identifier::TenantSchema;
use crate::database::models::User;
use crate::database::registry;
use crate::services::TenantService;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List registered users and whether their schema exists")]
    List,

    #[command(about = "Create or repair a user's schema (safe to repeat)")]
    Provision {
        #[arg(help = "Username", required_unless_present = "all", conflicts_with = "all")]
        username: Option<String>,

        #[arg(long, help = "Provision every registered user")]
        all: bool,
    },
}

pub async fn handle(cmd: TenantCommands, context: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let tenants = TenantService::new(context.db.pool().clone(), &context.config.security);

    match cmd {
        TenantCommands::List => {
            let users = tenants.list_tenants().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No users registered");
            }

            let mut rows = Vec::with_capacity(users.len());
            for user in &users {
                let schema = TenantSchema::parse(&user.schema_name)?;
                let provisioned = registry::schema_exists(context.db.pool(), &schema).await?;
                rows.push((user, provisioned));
            }

            match output_format {
                OutputFormat::Json => {
                    let tenants: Vec<_> = rows
                        .iter()
                        .map(|(user, provisioned)| {
                            json!({
                                "id": user.id,
                                "username": user.username,
                                "email": user.email,
                                "schema": user.schema_name,
                                "provisioned": provisioned,
                                "created_at": user.created_at,
                            })
                        })
                        .collect();
                    output_json(&json!({ "tenants": tenants }))?;
                }
                OutputFormat::Text => {
                    println!("{:<20} {:<30} {:<36} {:<6} {}", "USERNAME", "EMAIL", "SCHEMA", "OK", "CREATED");
                    println!("{}", "-".repeat(110));
                    for (user, provisioned) in rows {
                        println!(
                            "{:<20} {:<30} {:<36} {:<6} {}",
                            truncate(&user.username, 20),
                            truncate(&user.email, 30),
                            truncate(&user.schema_name, 36),
                            if provisioned { "yes" } else { "NO" },
                            user.created_at.format("%Y-%m-%d %H:%M"),
                        );
                    }
                }
            }
            Ok(())
        }
        TenantCommands::Provision { username, all } => {
            registry::bootstrap_global(context.db.pool()).await?;

            let users: Vec<User> = if all {
                tenants.list_tenants().await?
            } else {
                let username = username.unwrap_or_default();
                let user = tenants
                    .find_by_username(&username)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;
                vec![user]
            };

            let mut provisioned = Vec::with_capacity(users.len());
            for user in &users {
                let schema = TenantSchema::parse(&user.schema_name)?;
                registry::provision_tenant_schema(context.db.pool(), &schema).await?;
                provisioned.push(json!({ "username": user.username, "schema": user.schema_name }));
                if let OutputFormat::Text = output_format {
                    println!("  {} -> {}", user.username, schema);
                }
            }

            output_success(
                &output_format,
                &format!("Provisioned {} schema(s)", provisioned.len()),
                Some(json!({ "provisioned": provisioned })),
            )
        }
    }
}
