// handlers/protected/resources/list.rs - GET /resources?page&limit&search

use axum::{
    extract::{Query, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult, ListingParams, Pagination};
use crate::services::ResourceService;
use crate::state::AppState;

pub async fn resource_list(
    State(state): State<AppState>,
    Extension(pagination): Extension<Pagination>,
    Query(params): Query<ListingParams>,
) -> ApiResult<Value> {
    info!("started fetching all resources");
    let query = pagination.query(params.search);

    let page = ResourceService::new(state.store.clone())
        .list(&query)
        .await
        .map_err(|e| {
            error!("fetching all resources failed: {}", e);
            e
        })?;

    info!(total = page.total_count, "fetching all resources success");
    let data: Vec<Value> = page.data.iter().map(|r| r.to_api_value()).collect();
    Ok(ApiResponse::success(json!({ "data": data, "totalCount": page.total_count })))
}
