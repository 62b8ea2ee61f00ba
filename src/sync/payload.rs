//! Request payloads understood by the synchronizer, and the resource patch/merge.

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use super::diff::{diff, distinct};
use super::error::SyncError;
use crate::database::models::resource::DEFAULT_STATUS;
use crate::database::models::Resource;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Normalize an external UUID, rejecting malformed input
pub fn parse_external_uuid(value: &str) -> Result<String, SyncError> {
    Uuid::parse_str(value.trim())
        .map(|u| u.to_string())
        .map_err(|_| SyncError::validation("Wrong UUID format passed"))
}

fn object_id(field: &str, value: &str) -> Result<ObjectId, String> {
    ObjectId::parse_str(value).map_err(|_| format!("Invalid {} '{}'", field, value))
}

fn optional_object_id(field: &str, value: Option<String>) -> Result<Option<ObjectId>, String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| object_id(field, &v))
        .transpose()
}

/// Placement of a resource into a stream. A missing role means the team role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStreamAssignment")]
pub struct StreamAssignment {
    pub stream: ObjectId,
    pub role: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<ObjectId>,
}

impl StreamAssignment {
    pub fn new(stream: ObjectId, role: Option<&str>) -> Self {
        Self {
            stream,
            role: role.map(str::to_string),
            is_approved: false,
            approved_by: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStreamAssignment {
    Id(String),
    Entry(RawStreamEntry),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamEntry {
    stream_id: String,
    role: Option<String>,
    #[serde(default)]
    is_approved: bool,
    approved_by: Option<String>,
}

impl TryFrom<RawStreamAssignment> for StreamAssignment {
    type Error = String;

    fn try_from(raw: RawStreamAssignment) -> Result<Self, Self::Error> {
        match raw {
            RawStreamAssignment::Id(id) => Ok(Self {
                stream: object_id("streamId", &id)?,
                role: None,
                is_approved: false,
                approved_by: None,
            }),
            RawStreamAssignment::Entry(entry) => Ok(Self {
                stream: object_id("streamId", &entry.stream_id)?,
                role: entry.role.filter(|r| !r.is_empty()),
                is_approved: entry.is_approved,
                approved_by: optional_object_id("approvedBy", entry.approved_by)?,
            }),
        }
    }
}

/// Placement of a resource into a project under an optional role
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawProjectAssignment")]
pub struct ProjectAssignment {
    pub project: ObjectId,
    pub role: Option<ObjectId>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProjectAssignment {
    Id(String),
    Entry {
        #[serde(rename = "projectId")]
        project_id: String,
        #[serde(rename = "roleId")]
        role_id: Option<String>,
    },
}

impl TryFrom<RawProjectAssignment> for ProjectAssignment {
    type Error = String;

    fn try_from(raw: RawProjectAssignment) -> Result<Self, Self::Error> {
        match raw {
            RawProjectAssignment::Id(id) => Ok(Self {
                project: object_id("projectId", &id)?,
                role: None,
            }),
            RawProjectAssignment::Entry { project_id, role_id } => Ok(Self {
                project: object_id("projectId", &project_id)?,
                role: optional_object_id("roleId", role_id)?,
            }),
        }
    }
}

fn stream_ids(assignments: &[StreamAssignment]) -> Vec<ObjectId> {
    let ids: Vec<ObjectId> = assignments.iter().map(|a| a.stream).collect();
    distinct(&ids)
}

fn project_ids(assignments: &[ProjectAssignment]) -> Vec<ObjectId> {
    let ids: Vec<ObjectId> = assignments.iter().map(|a| a.project).collect();
    distinct(&ids)
}

fn require_text(field: &str, value: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

fn require_email(value: &str) -> Result<(), SyncError> {
    if !is_valid_email(value) {
        return Err(SyncError::validation("Email address is invalid"));
    }
    Ok(())
}

/// Body of a resource creation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewResource {
    pub name: String,
    pub employee_id: String,
    pub email: String,
    pub grade: String,
    pub location: String,
    pub virtual_team: String,
    pub joined_at: NaiveDate,
    pub status: Option<String>,
    #[serde(default)]
    pub streams: Vec<StreamAssignment>,
    #[serde(default)]
    pub projects: Vec<ProjectAssignment>,
}

impl NewResource {
    pub fn validate(&self) -> Result<(), SyncError> {
        require_text("name", &self.name)?;
        require_text("employeeId", &self.employee_id)?;
        require_text("grade", &self.grade)?;
        require_text("location", &self.location)?;
        require_text("virtualTeam", &self.virtual_team)?;
        require_email(&self.email)
    }

    /// Build the resource document with its initial membership lists
    pub fn to_resource(&self, now: DateTime<Utc>) -> Resource {
        Resource {
            id: ObjectId::new(),
            uuid: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            employee_id: self.employee_id.trim().to_string(),
            email: self.email.trim().to_string(),
            grade: self.grade.trim().to_string(),
            location: self.location.trim().to_string(),
            virtual_team: self.virtual_team.trim().to_string(),
            joined_at: self.joined_at,
            status: self
                .status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_STATUS)
                .to_string(),
            streams: stream_ids(&self.streams),
            projects: project_ids(&self.projects),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a resource. Absent fields are left untouched; an
/// explicit empty `streams`/`projects` list removes every membership.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub grade: Option<String>,
    pub location: Option<String>,
    pub virtual_team: Option<String>,
    pub joined_at: Option<NaiveDate>,
    pub status: Option<String>,
    pub streams: Option<Vec<StreamAssignment>>,
    pub projects: Option<Vec<ProjectAssignment>>,
}

/// Result of merging a patch: the new record plus the names of changed fields
#[derive(Debug, Clone, PartialEq)]
pub struct Patched {
    pub record: Resource,
    pub changed: Vec<&'static str>,
}

impl ResourcePatch {
    pub fn validate(&self) -> Result<(), SyncError> {
        let texts = [
            ("name", &self.name),
            ("employeeId", &self.employee_id),
            ("grade", &self.grade),
            ("location", &self.location),
            ("virtualTeam", &self.virtual_team),
            ("status", &self.status),
        ];
        for (field, value) in texts {
            if let Some(v) = value {
                require_text(field, v)?;
            }
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn stream_ids(&self) -> Option<Vec<ObjectId>> {
        self.streams.as_deref().map(stream_ids)
    }

    pub fn project_ids(&self) -> Option<Vec<ObjectId>> {
        self.projects.as_deref().map(project_ids)
    }

    /// Merge onto `current` without touching it
    pub fn apply(&self, current: &Resource, now: DateTime<Utc>) -> Patched {
        let mut record = current.clone();
        let mut changed = Vec::new();

        let texts: [(&'static str, &Option<String>, &mut String); 7] = [
            ("name", &self.name, &mut record.name),
            ("employeeId", &self.employee_id, &mut record.employee_id),
            ("email", &self.email, &mut record.email),
            ("grade", &self.grade, &mut record.grade),
            ("location", &self.location, &mut record.location),
            ("virtualTeam", &self.virtual_team, &mut record.virtual_team),
            ("status", &self.status, &mut record.status),
        ];
        for (field, value, slot) in texts {
            if let Some(v) = value {
                let v = v.trim();
                if slot.as_str() != v {
                    *slot = v.to_string();
                    changed.push(field);
                }
            }
        }

        if let Some(joined_at) = self.joined_at {
            if record.joined_at != joined_at {
                record.joined_at = joined_at;
                changed.push("joinedAt");
            }
        }

        if let Some(ids) = self.stream_ids() {
            if !diff(&record.streams, &ids).is_empty() {
                record.streams = ids;
                changed.push("streams");
            }
        }
        if let Some(ids) = self.project_ids() {
            if !diff(&record.projects, &ids).is_empty() {
                record.projects = ids;
                changed.push("projects");
            }
        }

        if !changed.is_empty() {
            record.updated_at = now;
        }
        Patched { record, changed }
    }
}

/// Bulk stream membership change applied in one transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamMembershipChange {
    #[serde(default)]
    pub add: Vec<MemberAddition>,
    #[serde(default)]
    pub delete: Vec<MemberRemoval>,
    #[serde(default)]
    pub update: Vec<ApprovalChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMemberEntry {
    resource_id: String,
    stream_id: String,
    role: Option<String>,
    #[serde(default)]
    is_approved: bool,
    approved_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMemberEntry")]
pub struct MemberAddition {
    pub resource: ObjectId,
    pub assignment: StreamAssignment,
}

impl TryFrom<RawMemberEntry> for MemberAddition {
    type Error = String;

    fn try_from(raw: RawMemberEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            resource: object_id("resourceId", &raw.resource_id)?,
            assignment: StreamAssignment {
                stream: object_id("streamId", &raw.stream_id)?,
                role: raw.role.filter(|r| !r.is_empty()),
                is_approved: raw.is_approved,
                approved_by: optional_object_id("approvedBy", raw.approved_by)?,
            },
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMemberRef {
    resource_id: String,
    stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMemberRef")]
pub struct MemberRemoval {
    pub resource: ObjectId,
    pub stream: ObjectId,
}

impl TryFrom<RawMemberRef> for MemberRemoval {
    type Error = String;

    fn try_from(raw: RawMemberRef) -> Result<Self, Self::Error> {
        Ok(Self {
            resource: object_id("resourceId", &raw.resource_id)?,
            stream: object_id("streamId", &raw.stream_id)?,
        })
    }
}

/// Approval flag change on a bucket entry or team record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMemberEntry")]
pub struct ApprovalChange {
    pub resource: ObjectId,
    pub stream: ObjectId,
    pub role: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<ObjectId>,
}

impl TryFrom<RawMemberEntry> for ApprovalChange {
    type Error = String;

    fn try_from(raw: RawMemberEntry) -> Result<Self, Self::Error> {
        let approved_by = optional_object_id("approvedBy", raw.approved_by)?;
        Ok(Self {
            resource: object_id("resourceId", &raw.resource_id)?,
            stream: object_id("streamId", &raw.stream_id)?,
            role: raw.role.filter(|r| !r.is_empty()),
            is_approved: raw.is_approved,
            // approver only recorded while approved
            approved_by: approved_by.filter(|_| raw.is_approved),
        })
    }
}
