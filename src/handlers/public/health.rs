// handlers/public/health.rs - GET /status

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

const OK: &str = "ok";
const NOK: &str = "nok";

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    info!("Starting health check");
    let database = match state.store.ping().await {
        Ok(()) => OK,
        Err(e) => {
            warn!("Database ping failed: {}", e);
            NOK
        }
    };
    info!("Health check completed");
    Json(json!({ "api_service": OK, "database": database }))
}
