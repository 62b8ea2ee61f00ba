use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

use super::models::{
    Project, ProjectMember, Resource, ResourceSummary, Role, Stream, StreamBucket, StreamMember,
    StreamSummary, Team, User,
};

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Injected fault in operation '{0}'")]
    Fault(&'static str),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// Page window and optional name-prefix search for listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub skip: u64,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// Largest skip a BSON int64 can carry
const MAX_SKIP: u64 = i64::MAX as u64;

impl PageQuery {
    /// Build from 1-based page number and page size
    pub fn from_page(page: u64, limit: u64, search: Option<String>) -> Self {
        Self {
            skip: page.saturating_sub(1).saturating_mul(limit).min(MAX_SKIP),
            limit: Some(limit),
            search: search.filter(|s| !s.is_empty()),
        }
    }

    /// Case-insensitive prefix match used by both store backends
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.search {
            Some(prefix) => name.to_lowercase().starts_with(&prefix.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}

/// Document store entry point
#[async_trait]
pub trait Store: Send + Sync {
    /// Open an atomic transaction scope
    async fn begin(&self) -> Result<Box<dyn Session>, StoreError>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Transaction-scoped operations over the roster collections.
///
/// Nothing written through a session is visible to other sessions until
/// `commit` succeeds; `abort` (or dropping the session) discards every write.
#[async_trait]
pub trait Session: Send {
    // Resources
    async fn find_resource(&mut self, uuid: &str) -> Result<Option<Resource>, StoreError>;
    async fn find_resource_by_id(&mut self, id: ObjectId) -> Result<Option<Resource>, StoreError>;
    async fn find_resources_by_ids(&mut self, ids: &[ObjectId]) -> Result<Vec<Resource>, StoreError>;
    async fn list_resources(&mut self, query: &PageQuery) -> Result<Page<ResourceSummary>, StoreError>;
    async fn insert_resource(&mut self, resource: &Resource) -> Result<(), StoreError>;
    async fn replace_resource(&mut self, resource: &Resource) -> Result<(), StoreError>;
    async fn delete_resource(&mut self, id: ObjectId) -> Result<bool, StoreError>;
    /// Add-to-set a stream reference onto a resource
    async fn add_stream_to_resource(&mut self, resource: ObjectId, stream: ObjectId) -> Result<(), StoreError>;
    /// Pull a stream reference from one resource, or from all when `resource` is None
    async fn pull_stream_from_resources(&mut self, stream: ObjectId, resource: Option<ObjectId>) -> Result<(), StoreError>;

    // Streams
    async fn find_stream(&mut self, uuid: &str) -> Result<Option<Stream>, StoreError>;
    async fn find_stream_by_id(&mut self, id: ObjectId) -> Result<Option<Stream>, StoreError>;
    async fn list_streams(&mut self, query: &PageQuery) -> Result<Page<StreamSummary>, StoreError>;
    async fn insert_stream(&mut self, stream: &Stream) -> Result<(), StoreError>;
    async fn rename_stream(&mut self, id: ObjectId, name: &str) -> Result<(), StoreError>;
    async fn delete_stream(&mut self, id: ObjectId) -> Result<bool, StoreError>;
    /// Push a member into a bucket unless the resource already sits there. Returns true if written.
    async fn push_stream_member(&mut self, stream: ObjectId, bucket: StreamBucket, member: &StreamMember) -> Result<bool, StoreError>;
    /// Pull the resource from `lead` and `supportingLeads`, restricted to `streams` when given
    async fn pull_stream_members(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<(), StoreError>;
    async fn set_stream_member_approval(
        &mut self,
        stream: ObjectId,
        bucket: StreamBucket,
        resource: ObjectId,
        is_approved: bool,
        approved_by: Option<ObjectId>,
    ) -> Result<(), StoreError>;

    // Teams
    async fn find_team(&mut self, stream: ObjectId, resource: ObjectId) -> Result<Option<Team>, StoreError>;
    async fn find_stream_teams(&mut self, stream: ObjectId, is_approved: Option<bool>) -> Result<Vec<Team>, StoreError>;
    async fn insert_team(&mut self, team: &Team) -> Result<(), StoreError>;
    /// Delete the resource's teams, restricted to `streams` when given
    async fn delete_resource_teams(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<u64, StoreError>;
    async fn delete_stream_teams(&mut self, stream: ObjectId) -> Result<u64, StoreError>;
    async fn set_team_approval(
        &mut self,
        stream: ObjectId,
        resource: ObjectId,
        is_approved: bool,
        approved_by: Option<ObjectId>,
    ) -> Result<(), StoreError>;

    // Projects and roles
    async fn find_project_by_id(&mut self, id: ObjectId) -> Result<Option<Project>, StoreError>;
    async fn insert_project(&mut self, project: &Project) -> Result<(), StoreError>;
    async fn add_project_manager(&mut self, project: ObjectId, resource: ObjectId) -> Result<(), StoreError>;
    /// Push a member unless the resource is already listed. Returns true if written.
    async fn add_project_member(&mut self, project: ObjectId, member: &ProjectMember) -> Result<bool, StoreError>;
    /// Pull the resource from `managers` and `resources`, restricted to `projects` when given
    async fn pull_project_resource(&mut self, resource: ObjectId, projects: Option<&[ObjectId]>) -> Result<(), StoreError>;
    async fn find_role_by_name(&mut self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn insert_role(&mut self, role: &Role) -> Result<(), StoreError>;

    // Users
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn abort(self: Box<Self>) -> Result<(), StoreError>;
}
