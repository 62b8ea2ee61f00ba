use bson::oid::ObjectId;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::diff::{diff, Diff};
use super::error::SyncError;
use super::mutators;
use super::payload::{parse_external_uuid, NewResource, ResourcePatch, StreamMembershipChange};
use crate::config::RoleConfig;
use crate::database::models::{Resource, Stream};
use crate::database::{Session, Store};

/// Lifecycle of one synchronizer transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Diffing,
    Applying,
    Committed,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Begin => "begin",
            Phase::Diffing => "diffing",
            Phase::Applying => "applying",
            Phase::Committed => "committed",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Session plus the phase it is in
struct Transaction {
    session: Box<dyn Session>,
    operation: &'static str,
    phase: Phase,
}

impl Transaction {
    async fn begin(store: &dyn Store, operation: &'static str) -> Result<Self, SyncError> {
        let session = store.begin().await?;
        debug!(operation, phase = %Phase::Begin, "transaction opened");
        Ok(Self { session, operation, phase: Phase::Begin })
    }

    fn enter(&mut self, phase: Phase) {
        debug!(operation = self.operation, from = %self.phase, to = %phase, "transaction phase");
        self.phase = phase;
    }

    fn session(&mut self) -> &mut dyn Session {
        self.session.as_mut()
    }

    /// Commit on success, abort on any failure
    async fn finish<T>(self, outcome: Result<T, SyncError>) -> Result<T, SyncError> {
        let Transaction { session, operation, phase } = self;
        match outcome {
            Ok(value) => {
                session.commit().await?;
                debug!(operation, from = %phase, to = %Phase::Committed, "transaction phase");
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort().await {
                    error!(operation, "transaction abort failed: {}", abort_err);
                }
                debug!(operation, from = %phase, to = %Phase::Aborted, kind = err.kind(), "transaction phase");
                Err(err)
            }
        }
    }
}

/// Keeps Resource, Stream, Team and Project references consistent
pub struct Synchronizer {
    store: Arc<dyn Store>,
    roles: RoleConfig,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn Store>, roles: RoleConfig) -> Self {
        Self { store, roles }
    }

    /// Insert a resource and seed its stream/project memberships
    pub async fn create_resource(&self, input: NewResource) -> Result<Resource, SyncError> {
        input.validate()?;
        let resource = input.to_resource(Utc::now());

        let mut tx = Transaction::begin(self.store.as_ref(), "create_resource").await?;
        tx.enter(Phase::Applying);
        let outcome = async {
            let session = tx.session();
            session.insert_resource(&resource).await?;
            mutators::add_to_streams_and_teams(session, &self.roles, resource.id, &input.streams).await?;
            mutators::add_to_projects(session, &self.roles, resource.id, &input.projects).await?;
            Ok::<_, SyncError>(())
        }
        .await;

        tx.finish(outcome).await?;
        info!(uuid = %resource.uuid, "resource created");
        Ok(resource)
    }

    /// Apply a partial update, syncing only the membership delta
    pub async fn update_resource(&self, uuid: &str, patch: ResourcePatch) -> Result<Resource, SyncError> {
        let uuid = parse_external_uuid(uuid)?;
        patch.validate()?;

        let mut tx = Transaction::begin(self.store.as_ref(), "update_resource").await?;
        let outcome = self.apply_update(&mut tx, &uuid, &patch).await;
        let resource = tx.finish(outcome).await?;

        info!(uuid = %resource.uuid, "resource updated");
        Ok(resource)
    }

    async fn apply_update(&self, tx: &mut Transaction, uuid: &str, patch: &ResourcePatch) -> Result<Resource, SyncError> {
        let current = tx
            .session()
            .find_resource(uuid)
            .await?
            .ok_or_else(|| SyncError::not_found("Resource with the given uuid not found"))?;

        tx.enter(Phase::Diffing);
        let stream_diff: Option<Diff<ObjectId>> = patch.stream_ids().map(|ids| diff(&current.streams, &ids));
        let project_diff: Option<Diff<ObjectId>> = patch.project_ids().map(|ids| diff(&current.projects, &ids));

        tx.enter(Phase::Applying);
        let session = tx.session();

        // removals before additions
        if let Some(d) = &stream_diff {
            mutators::remove_from_streams_and_teams(session, current.id, &d.removed).await?;
        }
        if let Some(d) = &project_diff {
            mutators::remove_from_projects(session, current.id, &d.removed).await?;
        }
        if let (Some(d), Some(assignments)) = (&stream_diff, &patch.streams) {
            let added: Vec<_> = assignments
                .iter()
                .filter(|a| d.added.contains(&a.stream))
                .cloned()
                .collect();
            mutators::add_to_streams_and_teams(session, &self.roles, current.id, &added).await?;
        }
        if let (Some(d), Some(assignments)) = (&project_diff, &patch.projects) {
            let added: Vec<_> = assignments
                .iter()
                .filter(|a| d.added.contains(&a.project))
                .cloned()
                .collect();
            mutators::add_to_projects(session, &self.roles, current.id, &added).await?;
        }

        let patched = patch.apply(&current, Utc::now());
        if !patched.changed.is_empty() {
            session.replace_resource(&patched.record).await?;
        }
        debug!(uuid, changed = ?patched.changed, "resource patched");
        Ok(patched.record)
    }

    /// Tear down every membership, then remove the resource
    pub async fn delete_resource(&self, uuid: &str) -> Result<(), SyncError> {
        let uuid = parse_external_uuid(uuid)?;

        let mut tx = Transaction::begin(self.store.as_ref(), "delete_resource").await?;
        let outcome = async {
            let session = tx.session();
            let resource = session
                .find_resource(&uuid)
                .await?
                .ok_or_else(|| SyncError::not_found("Resource with the given uuid not found"))?;
            mutators::remove_from_all_by_resource(session, resource.id).await?;
            session.delete_resource(resource.id).await?;
            Ok::<_, SyncError>(())
        }
        .await;

        tx.finish(outcome).await?;
        info!(uuid = %uuid, "resource deleted");
        Ok(())
    }

    /// Bulk stream membership change: deletions, then additions, then approvals
    pub async fn change_stream_members(&self, change: StreamMembershipChange) -> Result<(), SyncError> {
        let mut tx = Transaction::begin(self.store.as_ref(), "change_stream_members").await?;
        tx.enter(Phase::Applying);
        let outcome = async {
            let session = tx.session();
            for removal in &change.delete {
                mutators::remove_from_streams_and_teams(session, removal.resource, &[removal.stream]).await?;
                session.pull_stream_from_resources(removal.stream, Some(removal.resource)).await?;
            }
            for addition in &change.add {
                if session.find_resource_by_id(addition.resource).await?.is_none() {
                    return Err(SyncError::not_found(format!("Resource {} not found", addition.resource)));
                }
                mutators::add_to_streams_and_teams(
                    session,
                    &self.roles,
                    addition.resource,
                    std::slice::from_ref(&addition.assignment),
                )
                .await?;
                session
                    .add_stream_to_resource(addition.resource, addition.assignment.stream)
                    .await?;
            }
            mutators::set_stream_approvals(session, &self.roles, &change.update).await?;
            Ok::<_, SyncError>(())
        }
        .await;

        tx.finish(outcome).await
    }

    pub async fn create_stream(&self, name: &str) -> Result<Stream, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::validation("name is required"));
        }
        let stream = Stream::new(name);

        let mut tx = Transaction::begin(self.store.as_ref(), "create_stream").await?;
        let outcome = tx.session().insert_stream(&stream).await.map_err(SyncError::from);
        tx.finish(outcome).await?;

        info!(uuid = %stream.uuid, "stream created");
        Ok(stream)
    }

    /// Scalar rename; bucket membership is never touched here
    pub async fn rename_stream(&self, uuid: &str, name: &str) -> Result<Stream, SyncError> {
        let uuid = parse_external_uuid(uuid)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(SyncError::validation("name is required"));
        }

        let mut tx = Transaction::begin(self.store.as_ref(), "rename_stream").await?;
        let outcome = async {
            let session = tx.session();
            let mut stream = session
                .find_stream(&uuid)
                .await?
                .ok_or_else(|| SyncError::not_found(format!("Stream not found for {}", uuid)))?;
            session.rename_stream(stream.id, &name).await?;
            stream.name = name.clone();
            stream.updated_at = Utc::now();
            Ok::<_, SyncError>(stream)
        }
        .await;

        tx.finish(outcome).await
    }

    /// Delete a stream together with its team records and resource references
    pub async fn delete_stream(&self, uuid: &str) -> Result<(), SyncError> {
        let uuid = parse_external_uuid(uuid)?;

        let mut tx = Transaction::begin(self.store.as_ref(), "delete_stream").await?;
        let outcome = async {
            let session = tx.session();
            let stream: Stream = session
                .find_stream(&uuid)
                .await?
                .ok_or_else(|| SyncError::not_found(format!("Stream not found for {}", uuid)))?;
            session.delete_stream_teams(stream.id).await?;
            session.delete_stream(stream.id).await?;
            session.pull_stream_from_resources(stream.id, None).await?;
            Ok::<_, SyncError>(())
        }
        .await;

        tx.finish(outcome).await?;
        info!(uuid = %uuid, "stream deleted");
        Ok(())
    }
}
