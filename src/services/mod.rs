pub mod auth_service;
pub mod resource_service;
pub mod stream_service;

pub use auth_service::AuthService;
pub use resource_service::ResourceService;
pub use stream_service::{StreamDetail, StreamDetailQuery, StreamService};
