pub mod auth;
pub mod pagination;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use pagination::{pagination_middleware, ListingParams, Pagination};
pub use response::{ApiResponse, ApiResult};
