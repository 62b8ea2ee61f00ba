use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const PROJECT_COLLECTION: &str = "projects";
pub const ROLE_COLLECTION: &str = "roles";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub resource: ObjectId,
    #[serde(default)]
    pub role: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub managers: Vec<ObjectId>,
    #[serde(default)]
    pub resources: Vec<ProjectMember>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            managers: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// True if the resource is a manager or a member
    pub fn references(&self, resource: &ObjectId) -> bool {
        self.managers.contains(resource) || self.resources.iter().any(|m| &m.resource == resource)
    }
}

/// Project role (e.g. "Project Manager")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: ObjectId::new(), name: name.into() }
    }
}
