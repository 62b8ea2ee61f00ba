use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use roster_api::auth::TokenInfoVerifier;
use roster_api::config::AppConfig;
use roster_api::database::{MemoryStore, MongoStore, Store};
use roster_api::{app, AppState};

#[derive(Parser)]
#[command(name = "roster-api")]
#[command(about = "Resource roster HTTP API")]
#[command(version)]
struct Args {
    #[arg(long, env = "HOST", help = "Bind address")]
    host: Option<String>,

    #[arg(long, env = "PORT", help = "Listen port")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so MONGO_URI, JWT_SECRET etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting roster API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match &config.database.uri {
        Some(uri) => {
            let timeout = Duration::from_secs(config.database.connection_timeout);
            let store = MongoStore::connect(uri, &config.database.name, timeout)
                .await
                .context("failed to connect to MongoDB")?;
            tracing::info!(db = %config.database.name, "connected to MongoDB");
            Arc::new(store)
        }
        None => {
            tracing::warn!("MONGO_URI not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let google = Arc::new(TokenInfoVerifier::new(&config.google));
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, google);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("roster API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
