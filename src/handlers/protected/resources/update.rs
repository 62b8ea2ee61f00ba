// handlers/protected/resources/update.rs - PUT /resources/:resourceId

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::sync::ResourcePatch;

/// Partial update; `streams`/`projects`, when present, replace the membership set
pub async fn resource_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(resource_id): Path<String>,
    body: Result<Json<ResourcePatch>, JsonRejection>,
) -> ApiResult<Value> {
    info!(actor = %user.email, uuid = %resource_id, "Updating resource details started");
    let patch = json_body(body)?;

    match state.sync.update_resource(&resource_id, patch).await {
        Ok(resource) => {
            info!("Updating resource details success");
            Ok(ApiResponse::success(resource.to_api_value()))
        }
        Err(e) => {
            error!(kind = e.kind(), "Updating resource details failed: {}", e);
            Err(e.into())
        }
    }
}
