use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::models::{
    Project, ProjectMember, Resource, ResourceSummary, Role, Stream, StreamBucket, StreamMember,
    StreamSummary, Team, User,
};
use super::store::{Page, PageQuery, Session, Store, StoreError};

/// Full contents of the in-memory database
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub resources: Vec<Resource>,
    pub streams: Vec<Stream>,
    pub teams: Vec<Team>,
    pub projects: Vec<Project>,
    pub roles: Vec<Role>,
    pub users: Vec<User>,
}

/// Process-local store used for development runs and tests.
///
/// Each session works on a private copy taken at `begin` and `commit` swaps
/// the copy in. Sessions are serialized: `begin` waits until the previous
/// session has committed, aborted or been dropped.
#[derive(Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Collections>>,
    writer: Arc<AsyncMutex<()>>,
    faults: Arc<Mutex<HashSet<&'static str>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(collections: Collections) -> Self {
        Self {
            committed: Arc::new(RwLock::new(collections)),
            writer: Arc::default(),
            faults: Arc::default(),
        }
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> Collections {
        self.committed.read().await.clone()
    }

    /// Make every subsequent call of the named session operation fail
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Session>, StoreError> {
        let guard = self.writer.clone().lock_owned().await;
        let working = self.committed.read().await.clone();
        Ok(Box::new(MemorySession {
            working,
            _guard: guard,
            committed: self.committed.clone(),
            faults: self.faults.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemorySession {
    working: Collections,
    _guard: OwnedMutexGuard<()>,
    committed: Arc<RwLock<Collections>>,
    faults: Arc<Mutex<HashSet<&'static str>>>,
}

impl MemorySession {
    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        let injected = self
            .faults
            .lock()
            .map(|faults| faults.contains(operation))
            .unwrap_or(false);
        if injected {
            return Err(StoreError::Fault(operation));
        }
        Ok(())
    }

    fn stream_mut(&mut self, id: ObjectId) -> Option<&mut Stream> {
        self.working.streams.iter_mut().find(|s| s.id == id)
    }

    fn project_mut(&mut self, id: ObjectId) -> Option<&mut Project> {
        self.working.projects.iter_mut().find(|p| p.id == id)
    }
}

fn in_scope(id: &ObjectId, scope: Option<&[ObjectId]>) -> bool {
    scope.map_or(true, |ids| ids.contains(id))
}

fn paginate<T: Clone>(items: Vec<T>, query: &PageQuery) -> Page<T> {
    let total_count = items.len() as u64;
    let data = items
        .into_iter()
        .skip(query.skip as usize)
        .take(query.limit.map_or(usize::MAX, |l| l as usize))
        .collect();
    Page { data, total_count }
}

#[async_trait]
impl Session for MemorySession {
    async fn find_resource(&mut self, uuid: &str) -> Result<Option<Resource>, StoreError> {
        self.check("find_resource")?;
        Ok(self.working.resources.iter().find(|r| r.uuid == uuid).cloned())
    }

    async fn find_resource_by_id(&mut self, id: ObjectId) -> Result<Option<Resource>, StoreError> {
        self.check("find_resource_by_id")?;
        Ok(self.working.resources.iter().find(|r| r.id == id).cloned())
    }

    async fn find_resources_by_ids(&mut self, ids: &[ObjectId]) -> Result<Vec<Resource>, StoreError> {
        self.check("find_resources_by_ids")?;
        Ok(self
            .working
            .resources
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list_resources(&mut self, query: &PageQuery) -> Result<Page<ResourceSummary>, StoreError> {
        self.check("list_resources")?;
        let matching = self
            .working
            .resources
            .iter()
            .filter(|r| query.matches_name(&r.name))
            .map(ResourceSummary::from)
            .collect();
        Ok(paginate(matching, query))
    }

    async fn insert_resource(&mut self, resource: &Resource) -> Result<(), StoreError> {
        self.check("insert_resource")?;
        for existing in &self.working.resources {
            if existing.uuid == resource.uuid {
                return Err(StoreError::Duplicate("uuid".into()));
            }
            if existing.email == resource.email {
                return Err(StoreError::Duplicate("email".into()));
            }
            if existing.employee_id == resource.employee_id {
                return Err(StoreError::Duplicate("employeeId".into()));
            }
        }
        self.working.resources.push(resource.clone());
        Ok(())
    }

    async fn replace_resource(&mut self, resource: &Resource) -> Result<(), StoreError> {
        self.check("replace_resource")?;
        let clash = self.working.resources.iter().find(|r| {
            r.id != resource.id && (r.email == resource.email || r.employee_id == resource.employee_id)
        });
        if let Some(other) = clash {
            let field = if other.email == resource.email { "email" } else { "employeeId" };
            return Err(StoreError::Duplicate(field.into()));
        }
        if let Some(slot) = self.working.resources.iter_mut().find(|r| r.id == resource.id) {
            *slot = resource.clone();
        }
        Ok(())
    }

    async fn delete_resource(&mut self, id: ObjectId) -> Result<bool, StoreError> {
        self.check("delete_resource")?;
        let before = self.working.resources.len();
        self.working.resources.retain(|r| r.id != id);
        Ok(self.working.resources.len() != before)
    }

    async fn add_stream_to_resource(&mut self, resource: ObjectId, stream: ObjectId) -> Result<(), StoreError> {
        self.check("add_stream_to_resource")?;
        if let Some(r) = self.working.resources.iter_mut().find(|r| r.id == resource) {
            if !r.streams.contains(&stream) {
                r.streams.push(stream);
            }
        }
        Ok(())
    }

    async fn pull_stream_from_resources(&mut self, stream: ObjectId, resource: Option<ObjectId>) -> Result<(), StoreError> {
        self.check("pull_stream_from_resources")?;
        for r in self.working.resources.iter_mut() {
            if resource.map_or(true, |id| id == r.id) {
                r.streams.retain(|s| *s != stream);
            }
        }
        Ok(())
    }

    async fn find_stream(&mut self, uuid: &str) -> Result<Option<Stream>, StoreError> {
        self.check("find_stream")?;
        Ok(self.working.streams.iter().find(|s| s.uuid == uuid).cloned())
    }

    async fn find_stream_by_id(&mut self, id: ObjectId) -> Result<Option<Stream>, StoreError> {
        self.check("find_stream_by_id")?;
        Ok(self.working.streams.iter().find(|s| s.id == id).cloned())
    }

    async fn list_streams(&mut self, query: &PageQuery) -> Result<Page<StreamSummary>, StoreError> {
        self.check("list_streams")?;
        let matching = self
            .working
            .streams
            .iter()
            .filter(|s| query.matches_name(&s.name))
            .map(StreamSummary::from)
            .collect();
        Ok(paginate(matching, query))
    }

    async fn insert_stream(&mut self, stream: &Stream) -> Result<(), StoreError> {
        self.check("insert_stream")?;
        if self.working.streams.iter().any(|s| s.uuid == stream.uuid) {
            return Err(StoreError::Duplicate("uuid".into()));
        }
        self.working.streams.push(stream.clone());
        Ok(())
    }

    async fn rename_stream(&mut self, id: ObjectId, name: &str) -> Result<(), StoreError> {
        self.check("rename_stream")?;
        if let Some(stream) = self.stream_mut(id) {
            stream.name = name.to_string();
            stream.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn delete_stream(&mut self, id: ObjectId) -> Result<bool, StoreError> {
        self.check("delete_stream")?;
        let before = self.working.streams.len();
        self.working.streams.retain(|s| s.id != id);
        Ok(self.working.streams.len() != before)
    }

    async fn push_stream_member(&mut self, stream: ObjectId, bucket: StreamBucket, member: &StreamMember) -> Result<bool, StoreError> {
        self.check("push_stream_member")?;
        let Some(doc) = self.stream_mut(stream) else {
            return Ok(false);
        };
        let entries = doc.bucket_mut(bucket);
        if entries.iter().any(|m| m.resource == member.resource) {
            return Ok(false);
        }
        entries.push(member.clone());
        Ok(true)
    }

    async fn pull_stream_members(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<(), StoreError> {
        self.check("pull_stream_members")?;
        for stream in self.working.streams.iter_mut() {
            if !in_scope(&stream.id, streams) {
                continue;
            }
            for bucket in StreamBucket::ALL {
                stream.bucket_mut(bucket).retain(|m| m.resource != resource);
            }
        }
        Ok(())
    }

    async fn set_stream_member_approval(
        &mut self,
        stream: ObjectId,
        bucket: StreamBucket,
        resource: ObjectId,
        is_approved: bool,
        approved_by: Option<ObjectId>,
    ) -> Result<(), StoreError> {
        self.check("set_stream_member_approval")?;
        if let Some(doc) = self.stream_mut(stream) {
            // positional update touches the first match only
            if let Some(member) = doc.bucket_mut(bucket).iter_mut().find(|m| m.resource == resource) {
                member.is_approved = is_approved;
                member.approved_by = approved_by;
            }
        }
        Ok(())
    }

    async fn find_team(&mut self, stream: ObjectId, resource: ObjectId) -> Result<Option<Team>, StoreError> {
        self.check("find_team")?;
        Ok(self
            .working
            .teams
            .iter()
            .find(|t| t.stream == stream && t.resource == resource)
            .cloned())
    }

    async fn find_stream_teams(&mut self, stream: ObjectId, is_approved: Option<bool>) -> Result<Vec<Team>, StoreError> {
        self.check("find_stream_teams")?;
        Ok(self
            .working
            .teams
            .iter()
            .filter(|t| t.stream == stream && is_approved.map_or(true, |a| a == t.is_approved))
            .cloned()
            .collect())
    }

    async fn insert_team(&mut self, team: &Team) -> Result<(), StoreError> {
        self.check("insert_team")?;
        if self
            .working
            .teams
            .iter()
            .any(|t| t.stream == team.stream && t.resource == team.resource)
        {
            return Err(StoreError::Duplicate("stream_resource".into()));
        }
        self.working.teams.push(team.clone());
        Ok(())
    }

    async fn delete_resource_teams(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<u64, StoreError> {
        self.check("delete_resource_teams")?;
        let before = self.working.teams.len();
        self.working
            .teams
            .retain(|t| !(t.resource == resource && in_scope(&t.stream, streams)));
        Ok((before - self.working.teams.len()) as u64)
    }

    async fn delete_stream_teams(&mut self, stream: ObjectId) -> Result<u64, StoreError> {
        self.check("delete_stream_teams")?;
        let before = self.working.teams.len();
        self.working.teams.retain(|t| t.stream != stream);
        Ok((before - self.working.teams.len()) as u64)
    }

    async fn set_team_approval(
        &mut self,
        stream: ObjectId,
        resource: ObjectId,
        is_approved: bool,
        approved_by: Option<ObjectId>,
    ) -> Result<(), StoreError> {
        self.check("set_team_approval")?;
        if let Some(team) = self
            .working
            .teams
            .iter_mut()
            .find(|t| t.stream == stream && t.resource == resource)
        {
            team.is_approved = is_approved;
            team.approved_by = approved_by;
        }
        Ok(())
    }

    async fn find_project_by_id(&mut self, id: ObjectId) -> Result<Option<Project>, StoreError> {
        self.check("find_project_by_id")?;
        Ok(self.working.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), StoreError> {
        self.check("insert_project")?;
        self.working.projects.push(project.clone());
        Ok(())
    }

    async fn add_project_manager(&mut self, project: ObjectId, resource: ObjectId) -> Result<(), StoreError> {
        self.check("add_project_manager")?;
        if let Some(doc) = self.project_mut(project) {
            if !doc.managers.contains(&resource) {
                doc.managers.push(resource);
            }
        }
        Ok(())
    }

    async fn add_project_member(&mut self, project: ObjectId, member: &ProjectMember) -> Result<bool, StoreError> {
        self.check("add_project_member")?;
        let Some(doc) = self.project_mut(project) else {
            return Ok(false);
        };
        if doc.resources.iter().any(|m| m.resource == member.resource) {
            return Ok(false);
        }
        doc.resources.push(member.clone());
        Ok(true)
    }

    async fn pull_project_resource(&mut self, resource: ObjectId, projects: Option<&[ObjectId]>) -> Result<(), StoreError> {
        self.check("pull_project_resource")?;
        for project in self.working.projects.iter_mut() {
            if !in_scope(&project.id, projects) {
                continue;
            }
            project.managers.retain(|m| *m != resource);
            project.resources.retain(|m| m.resource != resource);
        }
        Ok(())
    }

    async fn find_role_by_name(&mut self, name: &str) -> Result<Option<Role>, StoreError> {
        self.check("find_role_by_name")?;
        Ok(self.working.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn insert_role(&mut self, role: &Role) -> Result<(), StoreError> {
        self.check("insert_role")?;
        self.working.roles.push(role.clone());
        Ok(())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.check("find_user_by_email")?;
        Ok(self.working.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.check("insert_user")?;
        if self.working.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        self.working.users.push(user.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check("commit")?;
        let MemorySession { working, committed, .. } = *self;
        *committed.write().await = working;
        debug!("memory session committed");
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<(), StoreError> {
        debug!("memory session aborted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();

        let mut session = store.begin().await.unwrap();
        session.insert_stream(&Stream::new("Data")).await.unwrap();
        session.abort().await.unwrap();
        assert!(store.snapshot().await.streams.is_empty());

        let mut session = store.begin().await.unwrap();
        session.insert_stream(&Stream::new("Data")).await.unwrap();
        session.commit().await.unwrap();
        assert_eq!(store.snapshot().await.streams.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_sessions_keep_both_commits() {
        let store = MemoryStore::new();

        let mut first = store.begin().await.unwrap();
        let second = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.begin().await.unwrap();
                session.insert_stream(&Stream::new("Billing")).await.unwrap();
                session.commit().await.unwrap();
            })
        };

        first.insert_stream(&Stream::new("Payments")).await.unwrap();
        first.commit().await.unwrap();
        second.await.unwrap();

        let mut names: Vec<_> = store.snapshot().await.streams.into_iter().map(|s| s.name).collect();
        names.sort();
        assert_eq!(names, vec!["Billing", "Payments"]);
    }

    #[tokio::test]
    async fn dropped_session_releases_the_store() {
        let store = MemoryStore::new();
        {
            let mut session = store.begin().await.unwrap();
            session.insert_stream(&Stream::new("Lost")).await.unwrap();
        }
        let session = tokio::time::timeout(std::time::Duration::from_secs(1), store.begin()).await;
        assert!(session.is_ok());
        assert!(store.snapshot().await.streams.is_empty());
    }

    #[tokio::test]
    async fn push_stream_member_is_guarded() {
        let stream = Stream::new("Platform");
        let store = MemoryStore::with_collections(Collections {
            streams: vec![stream.clone()],
            ..Default::default()
        });
        let member = StreamMember { resource: ObjectId::new(), is_approved: false, approved_by: None };

        let mut session = store.begin().await.unwrap();
        assert!(session.push_stream_member(stream.id, StreamBucket::Lead, &member).await.unwrap());
        assert!(!session.push_stream_member(stream.id, StreamBucket::Lead, &member).await.unwrap());
        // unknown stream matches nothing
        assert!(!session.push_stream_member(ObjectId::new(), StreamBucket::Lead, &member).await.unwrap());
        session.commit().await.unwrap();

        assert_eq!(store.snapshot().await.streams[0].lead.len(), 1);
    }

    #[tokio::test]
    async fn injected_fault_fails_operation() {
        let store = MemoryStore::new();
        store.fail_on("insert_team");

        let mut session = store.begin().await.unwrap();
        let err = session
            .insert_team(&Team::new(ObjectId::new(), ObjectId::new(), false, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Fault("insert_team")));

        store.clear_faults();
        assert!(session
            .insert_team(&Team::new(ObjectId::new(), ObjectId::new(), false, None))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn list_resources_filters_by_prefix_and_counts_all_matches() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        for (i, name) in ["Alice", "Alan", "Bob"].iter().enumerate() {
            let now = chrono::Utc::now();
            let resource = Resource {
                id: ObjectId::new(),
                uuid: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                employee_id: format!("E{}", i),
                email: format!("{}@example.com", name.to_lowercase()),
                grade: "G1".into(),
                location: "Pune".into(),
                virtual_team: "Core".into(),
                joined_at: chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                status: "Active".into(),
                streams: vec![],
                projects: vec![],
                created_at: now,
                updated_at: now,
            };
            session.insert_resource(&resource).await.unwrap();
        }

        let page = session
            .list_resources(&PageQuery::from_page(1, 1, Some("al".into())))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Alice");
    }
}
