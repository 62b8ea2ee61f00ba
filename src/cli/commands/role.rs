use clap::Subcommand;
use serde_json::json;
use tracing::warn;

use crate::cli::utils::{output_rows, output_success};
use crate::cli::OutputFormat;
use crate::database::models::Role;
use crate::database::Store;
use crate::sync::SyncError;

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "Create a project role (no-op if it exists)")]
    Add {
        #[arg(help = "Role name, e.g. 'Project Manager'")]
        name: String,
    },

    #[command(about = "Look up a role id by name")]
    Show {
        #[arg(help = "Role name")]
        name: String,
    },
}

pub async fn handle(cmd: RoleCommands, store: &dyn Store, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::Add { name } => {
            let role = ensure_role(store, &name).await?;
            output_success(
                output_format,
                &format!("Role '{}' ready", role.name),
                Some(json!({ "_id": role.id.to_hex(), "name": role.name })),
            )
        }
        RoleCommands::Show { name } => {
            let mut session = store.begin().await?;
            let found = session.find_role_by_name(&name).await;
            session.abort().await?;
            let role = found?.ok_or_else(|| anyhow::anyhow!("Role '{}' not found", name))?;
            output_rows(output_format, &[json!({ "_id": role.id.to_hex(), "name": role.name })])
        }
    }
}

/// Insert the role unless one with the same name exists
pub async fn ensure_role(store: &dyn Store, name: &str) -> Result<Role, SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::validation("name is required"));
    }

    let mut session = store.begin().await?;
    let outcome = async {
        if let Some(existing) = session.find_role_by_name(name).await? {
            return Ok(existing);
        }
        let role = Role::new(name);
        session.insert_role(&role).await?;
        Ok::<_, SyncError>(role)
    }
    .await;

    match outcome {
        Ok(role) => {
            session.commit().await?;
            Ok(role)
        }
        Err(e) => {
            if let Err(abort_err) = session.abort().await {
                warn!("role add: abort failed: {}", abort_err);
            }
            Err(e)
        }
    }
}
