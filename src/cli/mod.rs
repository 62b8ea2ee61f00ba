pub mod commands;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::{MongoStore, Store};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster admin CLI - seed users, roles and projects")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Users allowed to sign in")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Project roles")]
    Role {
        #[command(subcommand)]
        cmd: commands::role::RoleCommands,
    },

    #[command(about = "Projects")]
    Project {
        #[command(subcommand)]
        cmd: commands::project::ProjectCommands,
    },

    #[command(about = "Database connectivity check")]
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Admin commands always target MongoDB; the in-memory store would not persist
async fn connect(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    let uri = config
        .database
        .uri
        .as_deref()
        .context("MONGO_URI must be set for admin commands")?;
    let timeout = Duration::from_secs(config.database.connection_timeout);
    let store = MongoStore::connect(uri, &config.database.name, timeout).await?;
    Ok(Arc::new(store))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();
    let store = connect(&config).await?;

    match cli.command {
        Commands::User { cmd } => commands::user::handle(cmd, store.as_ref(), output_format).await,
        Commands::Role { cmd } => commands::role::handle(cmd, store.as_ref(), output_format).await,
        Commands::Project { cmd } => commands::project::handle(cmd, store.as_ref(), output_format).await,
        Commands::Ping => {
            store.ping().await?;
            utils::output_success(output_format, "Database reachable", None)
        }
    }
}
