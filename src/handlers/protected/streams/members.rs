// handlers/protected/streams/members.rs - PUT /streams/members

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::sync::StreamMembershipChange;

/// Bulk `{add, delete, update}` membership change in one transaction
pub async fn stream_members_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<StreamMembershipChange>, JsonRejection>,
) -> ApiResult<Value> {
    info!(actor = %user.email, "started adding resources to streams");
    let change = json_body(body)?;
    let (added, deleted, updated) = (change.add.len(), change.delete.len(), change.update.len());

    match state.sync.change_stream_members(change).await {
        Ok(()) => {
            info!(added, deleted, updated, "adding resources to streams success");
            Ok(ApiResponse::success(json!({
                "added": added,
                "deleted": deleted,
                "updated": updated,
            })))
        }
        Err(e) => {
            error!(kind = e.kind(), "adding resources to streams failed: {}", e);
            Err(e.into())
        }
    }
}
