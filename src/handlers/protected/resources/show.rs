// handlers/protected/resources/show.rs - GET /resources/:resourceId

use axum::extract::{Path, State};
use serde_json::Value;
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ResourceService;
use crate::state::AppState;

pub async fn resource_show(State(state): State<AppState>, Path(resource_id): Path<String>) -> ApiResult<Value> {
    info!(uuid = %resource_id, "Fetching resource by UUID started");

    match ResourceService::new(state.store.clone()).get(&resource_id).await {
        Ok(resource) => {
            info!("Fetching resource by UUID success");
            Ok(ApiResponse::success(resource.to_api_value()))
        }
        Err(e) => {
            error!(kind = e.kind(), "Fetching resource by UUID failed: {}", e);
            Err(e.into())
        }
    }
}
