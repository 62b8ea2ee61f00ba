// handlers/protected/streams/update.rs - PUT /streams/:streamId

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use super::StreamName;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn stream_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(stream_id): Path<String>,
    body: Result<Json<StreamName>, JsonRejection>,
) -> ApiResult<Value> {
    info!(actor = %user.email, uuid = %stream_id, "Updating stream details started");
    let StreamName { name } = json_body(body)?;

    match state.sync.rename_stream(&stream_id, &name).await {
        Ok(stream) => {
            info!("Updating stream details success");
            Ok(ApiResponse::success(json!({ "_id": stream.id.to_hex(), "name": stream.name })))
        }
        Err(e) => {
            error!(kind = e.kind(), "Updating stream details failed: {}", e);
            Err(e.into())
        }
    }
}
