// handlers/protected/streams/show.rs - GET /streams/:streamId?isApproved&page&limit&search

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::middleware::{ApiResponse, ApiResult, Pagination};
use crate::services::{StreamDetail, StreamDetailQuery, StreamService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDetailParams {
    pub is_approved: Option<String>,
    pub search: Option<String>,
}

impl StreamDetailParams {
    /// Any value other than `true` filters for unapproved entries
    fn approval_filter(&self) -> Option<bool> {
        self.is_approved.as_deref().map(|v| v == "true")
    }
}

pub async fn stream_show(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
    Extension(pagination): Extension<Pagination>,
    Query(params): Query<StreamDetailParams>,
) -> ApiResult<StreamDetail> {
    info!(uuid = %stream_id, "Fetching stream details by uuid started");
    let query = StreamDetailQuery {
        is_approved: params.approval_filter(),
        page: pagination.query(params.search.clone()),
    };

    match StreamService::new(state.store.clone()).detail(&stream_id, &query).await {
        Ok(detail) => {
            info!("Fetching stream details by uuid success");
            Ok(ApiResponse::success(detail))
        }
        Err(e) => {
            error!(kind = e.kind(), "Fetching stream details by uuid failed: {}", e);
            Err(e.into())
        }
    }
}
