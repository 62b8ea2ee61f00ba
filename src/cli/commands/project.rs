use clap::Subcommand;
use serde_json::json;
use tracing::warn;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::Project;
use crate::database::Store;
use crate::sync::SyncError;

#[derive(Subcommand)]
pub enum ProjectCommands {
    #[command(about = "Create an empty project")]
    Add {
        #[arg(help = "Project name")]
        name: String,
    },
}

pub async fn handle(cmd: ProjectCommands, store: &dyn Store, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProjectCommands::Add { name } => {
            let project = add_project(store, &name).await?;
            output_success(
                output_format,
                &format!("Project '{}' added", project.name),
                Some(json!({ "_id": project.id.to_hex(), "uuid": project.uuid, "name": project.name })),
            )
        }
    }
}

pub async fn add_project(store: &dyn Store, name: &str) -> Result<Project, SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::validation("name is required"));
    }

    let project = Project::new(name);
    let mut session = store.begin().await?;
    if let Err(e) = session.insert_project(&project).await {
        if let Err(abort_err) = session.abort().await {
            warn!("project add: abort failed: {}", abort_err);
        }
        return Err(e.into());
    }
    session.commit().await?;
    Ok(project)
}
