use std::sync::Arc;

use crate::database::models::{Resource, ResourceSummary};
use crate::database::{Page, PageQuery, Session, Store};
use crate::sync::payload::parse_external_uuid;
use crate::sync::SyncError;

/// Read-only resource queries, each in its own short-lived session
pub struct ResourceService {
    store: Arc<dyn Store>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<ResourceSummary>, SyncError> {
        let mut session = self.store.begin().await?;
        let page = session.list_resources(query).await;
        release(session).await;
        Ok(page?)
    }

    pub async fn get(&self, uuid: &str) -> Result<Resource, SyncError> {
        let uuid = parse_external_uuid(uuid)?;
        let mut session = self.store.begin().await?;
        let found = session.find_resource(&uuid).await;
        release(session).await;
        found?.ok_or_else(|| SyncError::not_found("Resource with the given uuid not found"))
    }
}

/// Close a read session without writing anything
pub(crate) async fn release(session: Box<dyn Session>) {
    if let Err(e) = session.abort().await {
        tracing::warn!("failed to release read session: {}", e);
    }
}
