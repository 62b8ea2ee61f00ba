use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const RESOURCE_COLLECTION: &str = "resources";

/// Default lifecycle status for newly created resources
pub const DEFAULT_STATUS: &str = "Active";

/// Employee document. `streams` and `projects` are denormalized references
/// kept in sync with the Stream, Team and Project collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uuid: String,
    pub name: String,
    pub employee_id: String,
    pub email: String,
    pub grade: String,
    pub location: String,
    pub virtual_team: String,
    pub joined_at: NaiveDate,
    pub status: String,
    #[serde(default)]
    pub streams: Vec<ObjectId>,
    #[serde(default)]
    pub projects: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Wire representation with hex ids
    pub fn to_api_value(&self) -> Value {
        json!({
            "_id": self.id.to_hex(),
            "uuid": self.uuid,
            "name": self.name,
            "employeeId": self.employee_id,
            "email": self.email,
            "grade": self.grade,
            "location": self.location,
            "virtualTeam": self.virtual_team,
            "joinedAt": self.joined_at.format("%Y-%m-%d").to_string(),
            "status": self.status,
            "streams": self.streams.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
            "projects": self.projects.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        })
    }
}

/// Listing projection of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uuid: String,
    pub name: String,
    pub email: String,
}

impl ResourceSummary {
    pub fn to_api_value(&self) -> Value {
        json!({
            "_id": self.id.to_hex(),
            "uuid": self.uuid,
            "name": self.name,
            "email": self.email,
        })
    }
}

impl From<&Resource> for ResourceSummary {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            uuid: resource.uuid.clone(),
            name: resource.name.clone(),
            email: resource.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_value_uses_hex_ids_and_plain_dates() {
        let now = Utc::now();
        let stream = ObjectId::new();
        let project = ObjectId::new();
        let resource = Resource {
            id: ObjectId::new(),
            uuid: "5f1d7c3e-8a4b-4c1e-9d2f-0a1b2c3d4e5f".into(),
            name: "Asha".into(),
            employee_id: "E100".into(),
            email: "asha@example.com".into(),
            grade: "G5".into(),
            location: "Pune".into(),
            virtual_team: "Core".into(),
            joined_at: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(),
            status: DEFAULT_STATUS.into(),
            streams: vec![stream],
            projects: vec![project],
            created_at: now,
            updated_at: now,
        };

        let value = resource.to_api_value();
        assert_eq!(value["_id"], resource.id.to_hex());
        assert_eq!(value["employeeId"], "E100");
        assert_eq!(value["joinedAt"], "2022-04-01");
        assert_eq!(value["streams"], json!([stream.to_hex()]));
        assert_eq!(value["projects"], json!([project.to_hex()]));

        let summary = ResourceSummary::from(&resource).to_api_value();
        assert_eq!(summary["email"], "asha@example.com");
        assert!(summary.get("grade").is_none());
    }
}
