// handlers/protected/streams/create.rs - POST /streams

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use super::StreamName;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn stream_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<StreamName>, JsonRejection>,
) -> ApiResult<Value> {
    info!(actor = %user.email, "Adding new stream started");
    let StreamName { name } = json_body(body)?;

    match state.sync.create_stream(&name).await {
        Ok(stream) => {
            info!(uuid = %stream.uuid, "Adding new stream success");
            Ok(ApiResponse::created(json!({
                "_id": stream.id.to_hex(),
                "uuid": stream.uuid,
                "name": stream.name,
            })))
        }
        Err(e) => {
            error!(kind = e.kind(), "Adding new stream failed: {}", e);
            Err(e.into())
        }
    }
}
