pub mod project;
pub mod resource;
pub mod stream;
pub mod team;
pub mod user;

pub use project::{Project, ProjectMember, Role, PROJECT_COLLECTION, ROLE_COLLECTION};
pub use resource::{Resource, ResourceSummary, RESOURCE_COLLECTION};
pub use stream::{Stream, StreamBucket, StreamMember, StreamSummary, STREAM_COLLECTION};
pub use team::{Team, TEAM_COLLECTION};
pub use user::{User, USER_COLLECTION};
