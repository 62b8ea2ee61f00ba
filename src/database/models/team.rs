use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const TEAM_COLLECTION: &str = "teams";

/// One resource's membership in one stream under the team role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub stream: ObjectId,
    pub resource: ObjectId,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub approved_by: Option<ObjectId>,
}

impl Team {
    pub fn new(stream: ObjectId, resource: ObjectId, is_approved: bool, approved_by: Option<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            stream,
            resource,
            is_approved,
            approved_by,
        }
    }
}
