// handlers/protected/streams/list.rs - GET /streams?page&limit&search

use axum::{
    extract::{Query, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult, ListingParams, Pagination};
use crate::services::StreamService;
use crate::state::AppState;

pub async fn stream_list(
    State(state): State<AppState>,
    Extension(pagination): Extension<Pagination>,
    Query(params): Query<ListingParams>,
) -> ApiResult<Value> {
    info!("Fetching stream started.");
    let query = pagination.query(params.search);

    let page = StreamService::new(state.store.clone())
        .list(&query)
        .await
        .map_err(|e| {
            error!("Fetching stream failed: {}", e);
            e
        })?;

    info!(total = page.total_count, "Fetching stream success.");
    let data: Vec<Value> = page
        .data
        .iter()
        .map(|s| json!({ "_id": s.id.to_hex(), "uuid": s.uuid, "name": s.name }))
        .collect();
    Ok(ApiResponse::success(json!({ "data": data, "totalCount": page.total_count })))
}
