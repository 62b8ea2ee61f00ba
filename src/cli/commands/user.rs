use clap::Subcommand;
use serde_json::json;
use tracing::warn;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::User;
use crate::database::Store;
use crate::sync::payload::is_valid_email;
use crate::sync::SyncError;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Allow an email address to sign in")]
    Add {
        #[arg(help = "Email address matching the Google account")]
        email: String,
        #[arg(help = "Display name")]
        name: String,
    },
}

pub async fn handle(cmd: UserCommands, store: &dyn Store, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add { email, name } => {
            let user = add_user(store, &email, &name).await?;
            output_success(
                output_format,
                &format!("User {} added", user.email),
                Some(json!({ "_id": user.id.to_hex(), "email": user.email, "name": user.name })),
            )
        }
    }
}

pub async fn add_user(store: &dyn Store, email: &str, name: &str) -> Result<User, SyncError> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(SyncError::validation("Email address is invalid"));
    }

    let user = User::new(email, name.trim());
    let mut session = store.begin().await?;
    if let Err(e) = session.insert_user(&user).await {
        if let Err(abort_err) = session.abort().await {
            warn!("user add: abort failed: {}", abort_err);
        }
        return Err(e.into());
    }
    session.commit().await?;
    Ok(user)
}
