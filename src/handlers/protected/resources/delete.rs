// handlers/protected/resources/delete.rs - DELETE /resources/:resourceId

use axum::{
    extract::{Path, State},
    Extension,
};
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn resource_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(resource_id): Path<String>,
) -> ApiResult<()> {
    info!(actor = %user.email, uuid = %resource_id, "Resource deletion by uuid started");

    match state.sync.delete_resource(&resource_id).await {
        Ok(()) => {
            info!("Resource deletion by uuid success");
            Ok(ApiResponse::no_content())
        }
        Err(e) => {
            error!(kind = e.kind(), "Resource deletion by uuid failed: {}", e);
            Err(e.into())
        }
    }
}
