// handlers/protected/streams/delete.rs - DELETE /streams/:streamId

use axum::{
    extract::{Path, State},
    Extension,
};
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Cascades to team records and resource `streams` references
pub async fn stream_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(stream_id): Path<String>,
) -> ApiResult<()> {
    info!(actor = %user.email, uuid = %stream_id, "Stream deletion started");

    match state.sync.delete_stream(&stream_id).await {
        Ok(()) => {
            info!("Stream deletion success");
            Ok(ApiResponse::no_content())
        }
        Err(e) => {
            error!(kind = e.kind(), "Stream deletion failed: {}", e);
            Err(e.into())
        }
    }
}
