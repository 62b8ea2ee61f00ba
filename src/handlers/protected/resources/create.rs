// handlers/protected/resources/create.rs - POST /resources/create

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::sync::NewResource;

/// Insert a resource and seed its stream/project memberships in one transaction
pub async fn resource_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<NewResource>, JsonRejection>,
) -> ApiResult<Value> {
    info!(actor = %user.email, "Adding new resource started");
    let input = json_body(body)?;

    match state.sync.create_resource(input).await {
        Ok(resource) => {
            info!(uuid = %resource.uuid, "Adding new resource success");
            Ok(ApiResponse::created(resource.to_api_value()))
        }
        Err(e) => {
            error!(kind = e.kind(), "Adding new resource failed: {}", e);
            Err(e.into())
        }
    }
}
