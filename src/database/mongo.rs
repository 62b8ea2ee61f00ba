//! MongoDB-backed store. Every `Session` owns a driver `ClientSession` with a
//! started transaction, so all writes issued through it commit or roll back
//! together. Transactions require a replica set deployment.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, ClientSession, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::info;

use super::models::{
    Project, ProjectMember, Resource, ResourceSummary, Role, Stream, StreamBucket, StreamMember,
    StreamSummary, Team, User, PROJECT_COLLECTION, RESOURCE_COLLECTION, ROLE_COLLECTION,
    STREAM_COLLECTION, TEAM_COLLECTION, USER_COLLECTION,
};
use super::store::{Page, PageQuery, Session, Store, StoreError};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect, verify with a ping and ensure unique indexes exist
    pub async fn connect(uri: &str, db_name: &str, timeout: Duration) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB database '{}'", db_name);

        let mut options = mongodb::options::ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        let client = Client::with_options(options)?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 }).await?;

        let store = Self { client, db };
        store.apply_indexes().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(store)
    }

    async fn apply_indexes(&self) -> Result<(), StoreError> {
        let unique = || Some(IndexOptions::builder().unique(true).build());
        let index = |keys: Document| IndexModel::builder().keys(keys).options(unique()).build();

        self.db
            .collection::<Document>(RESOURCE_COLLECTION)
            .create_indexes([
                index(doc! { "uuid": 1 }),
                index(doc! { "email": 1 }),
                index(doc! { "employeeId": 1 }),
            ])
            .await?;
        self.db
            .collection::<Document>(STREAM_COLLECTION)
            .create_index(index(doc! { "uuid": 1 }))
            .await?;
        self.db
            .collection::<Document>(TEAM_COLLECTION)
            .create_index(index(doc! { "stream": 1, "resource": 1 }))
            .await?;
        self.db
            .collection::<Document>(USER_COLLECTION)
            .create_index(index(doc! { "email": 1 }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn begin(&self) -> Result<Box<dyn Session>, StoreError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        Ok(Box::new(MongoSession {
            session,
            resources: self.db.collection(RESOURCE_COLLECTION),
            streams: self.db.collection(STREAM_COLLECTION),
            teams: self.db.collection(TEAM_COLLECTION),
            projects: self.db.collection(PROJECT_COLLECTION),
            roles: self.db.collection(ROLE_COLLECTION),
            users: self.db.collection(USER_COLLECTION),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

pub struct MongoSession {
    session: ClientSession,
    resources: Collection<Resource>,
    streams: Collection<Stream>,
    teams: Collection<Team>,
    projects: Collection<Project>,
    roles: Collection<Role>,
    users: Collection<User>,
}

/// Map duplicate-key write errors onto `StoreError::Duplicate`
fn classify(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY {
            return StoreError::Duplicate(write_error.message.clone());
        }
    }
    StoreError::Mongo(err)
}

fn to_bson<T: serde::Serialize>(value: &T) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn optional_id(id: Option<ObjectId>) -> Bson {
    id.map(Bson::ObjectId).unwrap_or(Bson::Null)
}

fn name_filter(query: &PageQuery) -> Document {
    match &query.search {
        Some(prefix) => doc! {
            "name": { "$regex": format!("^{}", regex::escape(prefix)), "$options": "i" }
        },
        None => doc! {},
    }
}

fn scoped(mut filter: Document, field: &str, scope: Option<&[ObjectId]>) -> Document {
    if let Some(ids) = scope {
        filter.insert(field, doc! { "$in": ids.to_vec() });
    }
    filter
}

impl MongoSession {
    async fn collect<T>(&mut self, collection: &Collection<T>, filter: Document) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let mut cursor = collection.find(filter).session(&mut self.session).await?;
        let mut out = Vec::new();
        while let Some(item) = cursor.next(&mut self.session).await {
            out.push(item?);
        }
        Ok(out)
    }

    async fn page<T>(&mut self, collection: Collection<T>, query: &PageQuery, projection: Document) -> Result<Page<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let filter = name_filter(query);
        let total_count = collection
            .count_documents(filter.clone())
            .session(&mut self.session)
            .await?;

        let mut find = collection
            .find(filter)
            .projection(projection)
            .skip(query.skip)
            .session(&mut self.session);
        if let Some(limit) = query.limit {
            find = find.limit(limit as i64);
        }
        let mut cursor = find.await?;
        let mut data = Vec::new();
        while let Some(item) = cursor.next(&mut self.session).await {
            data.push(item?);
        }
        Ok(Page { data, total_count })
    }
}

#[async_trait]
impl Session for MongoSession {
    async fn find_resource(&mut self, uuid: &str) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .resources
            .find_one(doc! { "uuid": uuid })
            .session(&mut self.session)
            .await?)
    }

    async fn find_resource_by_id(&mut self, id: ObjectId) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .resources
            .find_one(doc! { "_id": id })
            .session(&mut self.session)
            .await?)
    }

    async fn find_resources_by_ids(&mut self, ids: &[ObjectId]) -> Result<Vec<Resource>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let resources = self.resources.clone();
        self.collect(&resources, doc! { "_id": { "$in": ids.to_vec() } }).await
    }

    async fn list_resources(&mut self, query: &PageQuery) -> Result<Page<ResourceSummary>, StoreError> {
        let summaries = self.resources.clone_with_type::<ResourceSummary>();
        self.page(summaries, query, doc! { "_id": 1, "uuid": 1, "name": 1, "email": 1 })
            .await
    }

    async fn insert_resource(&mut self, resource: &Resource) -> Result<(), StoreError> {
        self.resources
            .insert_one(resource)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn replace_resource(&mut self, resource: &Resource) -> Result<(), StoreError> {
        self.resources
            .replace_one(doc! { "_id": resource.id }, resource)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_resource(&mut self, id: ObjectId) -> Result<bool, StoreError> {
        let result = self
            .resources
            .delete_one(doc! { "_id": id })
            .session(&mut self.session)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn add_stream_to_resource(&mut self, resource: ObjectId, stream: ObjectId) -> Result<(), StoreError> {
        self.resources
            .update_one(doc! { "_id": resource }, doc! { "$addToSet": { "streams": stream } })
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn pull_stream_from_resources(&mut self, stream: ObjectId, resource: Option<ObjectId>) -> Result<(), StoreError> {
        let mut filter = doc! { "streams": stream };
        if let Some(id) = resource {
            filter.insert("_id", id);
        }
        self.resources
            .update_many(filter, doc! { "$pull": { "streams": stream } })
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn find_stream(&mut self, uuid: &str) -> Result<Option<Stream>, StoreError> {
        Ok(self
            .streams
            .find_one(doc! { "uuid": uuid })
            .session(&mut self.session)
            .await?)
    }

    async fn find_stream_by_id(&mut self, id: ObjectId) -> Result<Option<Stream>, StoreError> {
        Ok(self
            .streams
            .find_one(doc! { "_id": id })
            .session(&mut self.session)
            .await?)
    }

    async fn list_streams(&mut self, query: &PageQuery) -> Result<Page<StreamSummary>, StoreError> {
        let summaries = self.streams.clone_with_type::<StreamSummary>();
        self.page(summaries, query, doc! { "_id": 1, "uuid": 1, "name": 1 }).await
    }

    async fn insert_stream(&mut self, stream: &Stream) -> Result<(), StoreError> {
        self.streams
            .insert_one(stream)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn rename_stream(&mut self, id: ObjectId, name: &str) -> Result<(), StoreError> {
        let updated_at = to_bson(&chrono::Utc::now())?;
        self.streams
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "name": name, "updatedAt": updated_at } },
            )
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn delete_stream(&mut self, id: ObjectId) -> Result<bool, StoreError> {
        let result = self
            .streams
            .delete_one(doc! { "_id": id })
            .session(&mut self.session)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn push_stream_member(&mut self, stream: ObjectId, bucket: StreamBucket, member: &StreamMember) -> Result<bool, StoreError> {
        let field = bucket.field();
        let filter = doc! {
            "_id": stream,
            format!("{}.resource", field): { "$ne": member.resource },
        };
        let update = doc! { "$push": { field: to_bson(member)? } };
        let result = self
            .streams
            .update_one(filter, update)
            .session(&mut self.session)
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_stream_members(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<(), StoreError> {
        let filter = scoped(
            doc! {
                "$or": [
                    { "lead.resource": resource },
                    { "supportingLeads.resource": resource },
                ]
            },
            "_id",
            streams,
        );
        let update = doc! {
            "$pull": {
                "lead": { "resource": resource },
                "supportingLeads": { "resource": resource },
            }
        };
        self.streams
            .update_many(filter, update)
            .session(&mut self.session)
            .await?;
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
        let field = bucket.field();
        let filter = doc! { "_id": stream, format!("{}.resource", field): resource };
        let update = doc! {
            "$set": {
                format!("{}.$.isApproved", field): is_approved,
                format!("{}.$.approvedBy", field): optional_id(approved_by),
            }
        };
        self.streams
            .update_one(filter, update)
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn find_team(&mut self, stream: ObjectId, resource: ObjectId) -> Result<Option<Team>, StoreError> {
        Ok(self
            .teams
            .find_one(doc! { "stream": stream, "resource": resource })
            .session(&mut self.session)
            .await?)
    }

    async fn find_stream_teams(&mut self, stream: ObjectId, is_approved: Option<bool>) -> Result<Vec<Team>, StoreError> {
        let mut filter = doc! { "stream": stream };
        if let Some(approved) = is_approved {
            filter.insert("isApproved", approved);
        }
        let teams = self.teams.clone();
        self.collect(&teams, filter).await
    }

    async fn insert_team(&mut self, team: &Team) -> Result<(), StoreError> {
        self.teams
            .insert_one(team)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_resource_teams(&mut self, resource: ObjectId, streams: Option<&[ObjectId]>) -> Result<u64, StoreError> {
        let filter = scoped(doc! { "resource": resource }, "stream", streams);
        let result = self
            .teams
            .delete_many(filter)
            .session(&mut self.session)
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_stream_teams(&mut self, stream: ObjectId) -> Result<u64, StoreError> {
        let result = self
            .teams
            .delete_many(doc! { "stream": stream })
            .session(&mut self.session)
            .await?;
        Ok(result.deleted_count)
    }

    async fn set_team_approval(
        &mut self,
        stream: ObjectId,
        resource: ObjectId,
        is_approved: bool,
        approved_by: Option<ObjectId>,
    ) -> Result<(), StoreError> {
        self.teams
            .update_one(
                doc! { "stream": stream, "resource": resource },
                doc! { "$set": { "isApproved": is_approved, "approvedBy": optional_id(approved_by) } },
            )
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn find_project_by_id(&mut self, id: ObjectId) -> Result<Option<Project>, StoreError> {
        Ok(self
            .projects
            .find_one(doc! { "_id": id })
            .session(&mut self.session)
            .await?)
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), StoreError> {
        self.projects
            .insert_one(project)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn add_project_manager(&mut self, project: ObjectId, resource: ObjectId) -> Result<(), StoreError> {
        self.projects
            .update_one(doc! { "_id": project }, doc! { "$addToSet": { "managers": resource } })
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn add_project_member(&mut self, project: ObjectId, member: &ProjectMember) -> Result<bool, StoreError> {
        let filter = doc! { "_id": project, "resources.resource": { "$ne": member.resource } };
        let update = doc! { "$push": { "resources": to_bson(member)? } };
        let result = self
            .projects
            .update_one(filter, update)
            .session(&mut self.session)
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_project_resource(&mut self, resource: ObjectId, projects: Option<&[ObjectId]>) -> Result<(), StoreError> {
        let filter = scoped(
            doc! {
                "$or": [
                    { "resources.resource": resource },
                    { "managers": resource },
                ]
            },
            "_id",
            projects,
        );
        let update = doc! {
            "$pull": {
                "resources": { "resource": resource },
                "managers": resource,
            }
        };
        self.projects
            .update_many(filter, update)
            .session(&mut self.session)
            .await?;
        Ok(())
    }

    async fn find_role_by_name(&mut self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self
            .roles
            .find_one(doc! { "name": name })
            .session(&mut self.session)
            .await?)
    }

    async fn insert_role(&mut self, role: &Role) -> Result<(), StoreError> {
        self.roles
            .insert_one(role)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .find_one(doc! { "email": email })
            .session(&mut self.session)
            .await?)
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.users
            .insert_one(user)
            .session(&mut self.session)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.session
            .commit_transaction()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    async fn abort(mut self: Box<Self>) -> Result<(), StoreError> {
        self.session
            .abort_transaction()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filter_escapes_search_prefix() {
        let query = PageQuery::from_page(1, 10, Some("a.b".into()));
        let filter = name_filter(&query);
        let name = filter.get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "^a\\.b");
        assert_eq!(name.get_str("$options").unwrap(), "i");

        assert!(name_filter(&PageQuery::default()).is_empty());
    }

    #[test]
    fn scoped_adds_in_clause_only_when_restricted() {
        let id = ObjectId::new();
        let restricted = scoped(doc! { "resource": id }, "stream", Some(&[id]));
        assert!(restricted.get_document("stream").unwrap().contains_key("$in"));

        let open = scoped(doc! { "resource": id }, "stream", None);
        assert!(!open.contains_key("stream"));
    }
}
