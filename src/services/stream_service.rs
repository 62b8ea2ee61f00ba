use bson::oid::ObjectId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::models::{Resource, StreamMember, StreamSummary};
use crate::database::{Page, PageQuery, Session, Store};
use crate::sync::payload::parse_external_uuid;
use crate::sync::SyncError;

use super::resource_service::release;

/// Filters for the stream detail view
#[derive(Debug, Clone, Default)]
pub struct StreamDetailQuery {
    pub is_approved: Option<bool>,
    pub page: PageQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulatedResource {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&Resource> for PopulatedResource {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.to_hex(),
            name: resource.name.clone(),
            email: resource.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedMember {
    pub resource: PopulatedResource,
    pub is_approved: bool,
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTeam {
    #[serde(rename = "_id")]
    pub id: String,
    pub stream: String,
    pub resource: PopulatedResource,
    pub is_approved: bool,
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCounts {
    #[serde(rename = "_id")]
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub lead_count: usize,
    pub supporting_leads_count: usize,
    pub team_members_count: usize,
    pub total_count: usize,
}

/// Stream with populated buckets and team members
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDetail {
    pub lead: Vec<PopulatedMember>,
    pub supporting_leads: Vec<PopulatedMember>,
    pub team_members: Vec<PopulatedTeam>,
    pub result: StreamCounts,
}

pub struct StreamService {
    store: Arc<dyn Store>,
}

impl StreamService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<StreamSummary>, SyncError> {
        let mut session = self.store.begin().await?;
        let page = session.list_streams(query).await;
        release(session).await;
        Ok(page?)
    }

    pub async fn detail(&self, uuid: &str, query: &StreamDetailQuery) -> Result<StreamDetail, SyncError> {
        let uuid = parse_external_uuid(uuid)?;
        let mut session = self.store.begin().await?;
        let detail = load_detail(session.as_mut(), &uuid, query).await;
        release(session).await;
        detail
    }
}

async fn load_detail(
    session: &mut dyn Session,
    uuid: &str,
    query: &StreamDetailQuery,
) -> Result<StreamDetail, SyncError> {
    let stream = session
        .find_stream(uuid)
        .await?
        .ok_or_else(|| SyncError::not_found(format!("Stream not found for {}", uuid)))?;
    let teams = session.find_stream_teams(stream.id, query.is_approved).await?;

    let mut ids: Vec<ObjectId> = stream.lead.iter().map(|m| m.resource).collect();
    ids.extend(stream.supporting_leads.iter().map(|m| m.resource));
    ids.extend(teams.iter().map(|t| t.resource));
    let resources: HashMap<ObjectId, Resource> = session
        .find_resources_by_ids(&ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    // entries pointing at deleted resources are dropped, like an unmatched populate
    let populate = |resource: &ObjectId| {
        resources
            .get(resource)
            .filter(|r| query.page.matches_name(&r.name))
            .map(PopulatedResource::from)
    };
    let members = |bucket: &[StreamMember]| -> Vec<PopulatedMember> {
        bucket
            .iter()
            .filter(|m| query.is_approved.map_or(true, |a| a == m.is_approved))
            .filter_map(|m| {
                populate(&m.resource).map(|resource| PopulatedMember {
                    resource,
                    is_approved: m.is_approved,
                    approved_by: m.approved_by.map(|id| id.to_hex()),
                })
            })
            .collect()
    };

    let lead = members(&stream.lead);
    let supporting_leads = members(&stream.supporting_leads);
    let team_members: Vec<PopulatedTeam> = teams
        .iter()
        .filter_map(|t| {
            populate(&t.resource).map(|resource| PopulatedTeam {
                id: t.id.to_hex(),
                stream: t.stream.to_hex(),
                resource,
                is_approved: t.is_approved,
                approved_by: t.approved_by.map(|id| id.to_hex()),
            })
        })
        .collect();

    let result = StreamCounts {
        id: stream.id.to_hex(),
        uuid: stream.uuid.clone(),
        name: stream.name.clone(),
        lead_count: lead.len(),
        supporting_leads_count: supporting_leads.len(),
        team_members_count: team_members.len(),
        total_count: lead.len() + supporting_leads.len() + team_members.len(),
    };

    Ok(StreamDetail {
        lead,
        supporting_leads: window(supporting_leads, &query.page),
        team_members: window(team_members, &query.page),
        result,
    })
}

fn window<T>(items: Vec<T>, page: &PageQuery) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit.map_or(usize::MAX, |l| l as usize))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleConfig;
    use crate::database::models::{Stream, StreamBucket};
    use crate::database::{Collections, MemoryStore};
    use crate::sync::payload::StreamAssignment;
    use crate::sync::{NewResource, Synchronizer};
    use serde_json::json;

    async fn seeded() -> (MemoryStore, Stream) {
        let stream = Stream::new("Payments");
        let store = MemoryStore::with_collections(Collections {
            streams: vec![stream.clone()],
            ..Default::default()
        });
        let sync = Synchronizer::new(Arc::new(store.clone()), RoleConfig::default());

        let people = [
            ("Asha", "lead", true),
            ("Arun", "supportingLeads", false),
            ("Bela", "supportingLeads", true),
            ("Anil", "TEAM", true),
            ("Bhim", "TEAM", false),
            ("Amar", "TEAM", true),
        ];
        for (i, (name, role, approved)) in people.iter().enumerate() {
            let mut input: NewResource = serde_json::from_value(json!({
                "name": name,
                "employeeId": format!("E{}", i),
                "email": format!("{}@example.com", name.to_lowercase()),
                "grade": "G3",
                "location": "Pune",
                "virtualTeam": "Core",
                "joinedAt": "2022-02-01",
            }))
            .unwrap();
            let mut assignment = StreamAssignment::new(stream.id, Some(role));
            assignment.is_approved = *approved;
            input.streams = vec![assignment];
            sync.create_resource(input).await.unwrap();
        }
        (store, stream)
    }

    #[tokio::test]
    async fn detail_counts_filtered_entries_and_pages_them() {
        let (store, stream) = seeded().await;
        let service = StreamService::new(Arc::new(store));

        let query = StreamDetailQuery {
            is_approved: None,
            page: PageQuery::from_page(1, 1, None),
        };
        let detail = service.detail(&stream.uuid, &query).await.unwrap();
        assert_eq!(detail.result.lead_count, 1);
        assert_eq!(detail.result.supporting_leads_count, 2);
        assert_eq!(detail.result.team_members_count, 3);
        assert_eq!(detail.result.total_count, 6);
        assert_eq!(detail.supporting_leads.len(), 1);
        assert_eq!(detail.team_members.len(), 1);
    }

    #[tokio::test]
    async fn detail_filters_by_approval_and_name_prefix() {
        let (store, stream) = seeded().await;
        let service = StreamService::new(Arc::new(store));

        let query = StreamDetailQuery {
            is_approved: Some(true),
            page: PageQuery::from_page(1, 10, Some("a".into())),
        };
        let detail = service.detail(&stream.uuid, &query).await.unwrap();
        let team: Vec<&str> = detail.team_members.iter().map(|t| t.resource.name.as_str()).collect();
        assert_eq!(team, vec!["Anil", "Amar"]);
        assert_eq!(detail.lead[0].resource.name, "Asha");
        assert!(detail.supporting_leads.is_empty());
    }

    #[tokio::test]
    async fn detail_of_unknown_stream_is_not_found() {
        let (store, _) = seeded().await;
        let service = StreamService::new(Arc::new(store));
        let err = service
            .detail(&uuid::Uuid::new_v4().to_string(), &StreamDetailQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn dangling_bucket_entries_are_skipped() {
        let mut stream = Stream::new("Orphans");
        stream.bucket_mut(StreamBucket::Lead).push(StreamMember {
            resource: ObjectId::new(),
            is_approved: true,
            approved_by: None,
        });
        let store = MemoryStore::with_collections(Collections {
            streams: vec![stream.clone()],
            ..Default::default()
        });
        let detail = StreamService::new(Arc::new(store))
            .detail(&stream.uuid, &StreamDetailQuery::default())
            .await
            .unwrap();
        assert!(detail.lead.is_empty());
        assert_eq!(detail.result.total_count, 0);
    }
}
