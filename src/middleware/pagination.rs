use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::config::PaginationConfig;
use crate::database::PageQuery;
use crate::error::ApiError;
use crate::state::AppState;

const INVALID_PAGINATION: &str =
    "Invalid pagination parameters. Please provide a valid page number and limit within the range of 1 to 100.";

/// Raw listing parameters; kept as strings so malformed numbers surface as 400s
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// Validated page window, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Absent values take the configured defaults
    pub fn parse(params: &ListingParams, config: &PaginationConfig) -> Result<Self, ApiError> {
        let page = parse_bound(params.page.as_deref(), config.default_page, u64::MAX)?;
        let limit = parse_bound(params.limit.as_deref(), config.default_limit, config.max_limit)?;
        Ok(Self { page, limit })
    }

    pub fn query(&self, search: Option<String>) -> PageQuery {
        PageQuery::from_page(self.page, self.limit, search)
    }
}

fn parse_bound(raw: Option<&str>, default: u64, max: u64) -> Result<u64, ApiError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| (1..=max).contains(n))
            .ok_or_else(|| ApiError::bad_request(INVALID_PAGINATION)),
    }
}

/// Rejects listing requests with out-of-range page or limit
pub async fn pagination_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Query(params) = Query::<ListingParams>::try_from_uri(request.uri())
        .map_err(|_| ApiError::bad_request(INVALID_PAGINATION))?;

    let pagination = Pagination::parse(&params, &state.config.pagination)?;
    request.extensions_mut().insert(pagination);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> ListingParams {
        ListingParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            search: None,
        }
    }

    #[test]
    fn defaults_apply_when_absent() {
        let config = PaginationConfig::default();
        let p = Pagination::parse(&params(None, None), &config).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 10 });
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = PaginationConfig::default();
        for (page, limit) in [("0", "10"), ("1", "0"), ("1", "101"), ("x", "10"), ("1", "2.5"), ("-1", "5")] {
            let err = Pagination::parse(&params(Some(page), Some(limit)), &config).unwrap_err();
            assert_eq!(err.error_code(), "BAD_REQUEST", "page={} limit={}", page, limit);
        }
    }

    #[test]
    fn window_maps_to_skip() {
        let config = PaginationConfig::default();
        let p = Pagination::parse(&params(Some("3"), Some("20")), &config).unwrap();
        let query = p.query(Some("al".into()));
        assert_eq!(query.skip, 40);
        assert_eq!(query.limit, Some(20));
    }
}
