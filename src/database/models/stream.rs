use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STREAM_COLLECTION: &str = "streams";

/// Named role-bucket on a stream document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamBucket {
    Lead,
    SupportingLeads,
}

impl StreamBucket {
    pub const ALL: [StreamBucket; 2] = [StreamBucket::Lead, StreamBucket::SupportingLeads];

    /// Document field holding the bucket
    pub fn field(&self) -> &'static str {
        match self {
            StreamBucket::Lead => "lead",
            StreamBucket::SupportingLeads => "supportingLeads",
        }
    }
}

impl fmt::Display for StreamBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for StreamBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(StreamBucket::Lead),
            "supportingLeads" => Ok(StreamBucket::SupportingLeads),
            other => Err(format!("Unknown stream role '{}'", other)),
        }
    }
}

/// Approval-gated resource reference inside a role-bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMember {
    pub resource: ObjectId,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub approved_by: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub lead: Vec<StreamMember>,
    #[serde(default)]
    pub supporting_leads: Vec<StreamMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stream {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            lead: Vec::new(),
            supporting_leads: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bucket(&self, bucket: StreamBucket) -> &[StreamMember] {
        match bucket {
            StreamBucket::Lead => &self.lead,
            StreamBucket::SupportingLeads => &self.supporting_leads,
        }
    }

    pub fn bucket_mut(&mut self, bucket: StreamBucket) -> &mut Vec<StreamMember> {
        match bucket {
            StreamBucket::Lead => &mut self.lead,
            StreamBucket::SupportingLeads => &mut self.supporting_leads,
        }
    }

    /// True if the resource sits in any role-bucket
    pub fn references(&self, resource: &ObjectId) -> bool {
        StreamBucket::ALL
            .iter()
            .any(|b| self.bucket(*b).iter().any(|m| &m.resource == resource))
    }
}

/// Listing projection of a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uuid: String,
    pub name: String,
}

impl From<&Stream> for StreamSummary {
    fn from(stream: &Stream) -> Self {
        Self {
            id: stream.id,
            uuid: stream.uuid.clone(),
            name: stream.name.clone(),
        }
    }
}
