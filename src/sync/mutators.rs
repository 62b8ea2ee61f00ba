//! Per-relationship writes that keep stream buckets, team records and project
//! lists in line with a resource's membership. Every function writes only
//! through the given session and is a no-op for an empty target set.

use bson::oid::ObjectId;
use tracing::debug;

use super::error::SyncError;
use super::payload::{ApprovalChange, ProjectAssignment, StreamAssignment};
use crate::config::RoleConfig;
use crate::database::models::{ProjectMember, StreamBucket, StreamMember, Team};
use crate::database::Session;

/// Where a stream role places a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPlacement {
    Team,
    Bucket(StreamBucket),
}

impl StreamPlacement {
    /// Unspecified role and the configured team role both mean a Team record
    pub fn resolve(role: Option<&str>, roles: &RoleConfig) -> Result<Self, SyncError> {
        match role {
            None => Ok(StreamPlacement::Team),
            Some(r) if r == roles.team_role => Ok(StreamPlacement::Team),
            Some(r) => r
                .parse::<StreamBucket>()
                .map(StreamPlacement::Bucket)
                .map_err(SyncError::Validation),
        }
    }
}

pub async fn add_to_streams_and_teams(
    session: &mut dyn Session,
    roles: &RoleConfig,
    resource: ObjectId,
    assignments: &[StreamAssignment],
) -> Result<(), SyncError> {
    for assignment in assignments {
        let placement = StreamPlacement::resolve(assignment.role.as_deref(), roles)?;

        if session.find_stream_by_id(assignment.stream).await?.is_none() {
            return Err(SyncError::not_found(format!("Stream {} not found", assignment.stream)));
        }

        match placement {
            StreamPlacement::Team => {
                if session.find_team(assignment.stream, resource).await?.is_some() {
                    debug!(stream = %assignment.stream, resource = %resource, "team membership already present");
                    continue;
                }
                let team = Team::new(assignment.stream, resource, assignment.is_approved, assignment.approved_by);
                session.insert_team(&team).await?;
            }
            StreamPlacement::Bucket(bucket) => {
                let member = StreamMember {
                    resource,
                    is_approved: assignment.is_approved,
                    approved_by: assignment.approved_by,
                };
                let written = session.push_stream_member(assignment.stream, bucket, &member).await?;
                if !written {
                    debug!(stream = %assignment.stream, resource = %resource, %bucket, "bucket entry already present");
                }
            }
        }
    }
    Ok(())
}

pub async fn remove_from_streams_and_teams(
    session: &mut dyn Session,
    resource: ObjectId,
    streams: &[ObjectId],
) -> Result<(), SyncError> {
    if streams.is_empty() {
        return Ok(());
    }
    let deleted = session.delete_resource_teams(resource, Some(streams)).await?;
    session.pull_stream_members(resource, Some(streams)).await?;
    debug!(resource = %resource, streams = streams.len(), teams_deleted = deleted, "removed from streams");
    Ok(())
}

pub async fn add_to_projects(
    session: &mut dyn Session,
    roles: &RoleConfig,
    resource: ObjectId,
    assignments: &[ProjectAssignment],
) -> Result<(), SyncError> {
    if assignments.is_empty() {
        return Ok(());
    }

    let manager = session
        .find_role_by_name(&roles.manager_role)
        .await?
        .ok_or_else(|| SyncError::conflict(format!("Role '{}' could not be resolved", roles.manager_role)))?;

    for assignment in assignments {
        if session.find_project_by_id(assignment.project).await?.is_none() {
            return Err(SyncError::not_found(format!("Project {} not found", assignment.project)));
        }

        if assignment.role == Some(manager.id) {
            session.add_project_manager(assignment.project, resource).await?;
        } else {
            let member = ProjectMember { resource, role: assignment.role };
            session.add_project_member(assignment.project, &member).await?;
        }
    }
    Ok(())
}

pub async fn remove_from_projects(
    session: &mut dyn Session,
    resource: ObjectId,
    projects: &[ObjectId],
) -> Result<(), SyncError> {
    if projects.is_empty() {
        return Ok(());
    }
    session.pull_project_resource(resource, Some(projects)).await?;
    Ok(())
}

/// Strip every reference to the resource from projects, teams and streams
pub async fn remove_from_all_by_resource(session: &mut dyn Session, resource: ObjectId) -> Result<(), SyncError> {
    session.pull_project_resource(resource, None).await?;
    session.delete_resource_teams(resource, None).await?;
    session.pull_stream_members(resource, None).await?;
    Ok(())
}

/// Flip approval on bucket entries or team records
pub async fn set_stream_approvals(
    session: &mut dyn Session,
    roles: &RoleConfig,
    changes: &[ApprovalChange],
) -> Result<(), SyncError> {
    for change in changes {
        match StreamPlacement::resolve(change.role.as_deref(), roles)? {
            StreamPlacement::Team => {
                session
                    .set_team_approval(change.stream, change.resource, change.is_approved, change.approved_by)
                    .await?
            }
            StreamPlacement::Bucket(bucket) => {
                session
                    .set_stream_member_approval(
                        change.stream,
                        bucket,
                        change.resource,
                        change.is_approved,
                        change.approved_by,
                    )
                    .await?
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Project, Role, Stream};
    use crate::database::{Collections, MemoryStore, Store};

    struct Fixture {
        store: MemoryStore,
        roles: RoleConfig,
        resource: ObjectId,
        stream: Stream,
        project: Project,
        manager: Role,
        developer: Role,
    }

    fn fixture() -> Fixture {
        let stream = Stream::new("Payments");
        let project = Project::new("Ledger");
        let manager = Role::new("Project Manager");
        let developer = Role::new("Developer");
        let store = MemoryStore::with_collections(Collections {
            streams: vec![stream.clone()],
            projects: vec![project.clone()],
            roles: vec![manager.clone(), developer.clone()],
            ..Default::default()
        });
        Fixture {
            store,
            roles: RoleConfig::default(),
            resource: ObjectId::new(),
            stream,
            project,
            manager,
            developer,
        }
    }

    #[test]
    fn placement_resolution() {
        let roles = RoleConfig::default();
        assert_eq!(StreamPlacement::resolve(None, &roles).unwrap(), StreamPlacement::Team);
        assert_eq!(StreamPlacement::resolve(Some("TEAM"), &roles).unwrap(), StreamPlacement::Team);
        assert_eq!(
            StreamPlacement::resolve(Some("supportingLeads"), &roles).unwrap(),
            StreamPlacement::Bucket(StreamBucket::SupportingLeads)
        );
        assert!(matches!(
            StreamPlacement::resolve(Some("owners"), &roles),
            Err(SyncError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn adding_twice_keeps_one_entry_per_bucket_and_team() {
        let f = fixture();
        let assignments = vec![
            StreamAssignment::new(f.stream.id, Some("supportingLeads")),
            StreamAssignment::new(f.stream.id, Some("TEAM")),
        ];

        for _ in 0..2 {
            let mut session = f.store.begin().await.unwrap();
            add_to_streams_and_teams(session.as_mut(), &f.roles, f.resource, &assignments)
                .await
                .unwrap();
            session.commit().await.unwrap();
        }

        let state = f.store.snapshot().await;
        assert_eq!(state.streams[0].supporting_leads.len(), 1);
        assert_eq!(state.teams.len(), 1);
    }

    #[tokio::test]
    async fn adding_to_missing_stream_is_not_found() {
        let f = fixture();
        let mut session = f.store.begin().await.unwrap();
        let err = add_to_streams_and_teams(
            session.as_mut(),
            &f.roles,
            f.resource,
            &[StreamAssignment::new(ObjectId::new(), Some("lead"))],
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn project_roles_route_to_managers_or_resources() {
        let f = fixture();
        let mut session = f.store.begin().await.unwrap();
        add_to_projects(
            session.as_mut(),
            &f.roles,
            f.resource,
            &[ProjectAssignment { project: f.project.id, role: Some(f.manager.id) }],
        )
        .await
        .unwrap();

        let other = ObjectId::new();
        add_to_projects(
            session.as_mut(),
            &f.roles,
            other,
            &[ProjectAssignment { project: f.project.id, role: Some(f.developer.id) }],
        )
        .await
        .unwrap();
        session.commit().await.unwrap();

        let project = &f.store.snapshot().await.projects[0];
        assert_eq!(project.managers, vec![f.resource]);
        assert_eq!(project.resources, vec![ProjectMember { resource: other, role: Some(f.developer.id) }]);
    }

    #[tokio::test]
    async fn missing_manager_role_is_conflict() {
        let f = fixture();
        let roles = RoleConfig { manager_role: "Delivery Lead".into(), ..RoleConfig::default() };
        let mut session = f.store.begin().await.unwrap();
        let err = add_to_projects(
            session.as_mut(),
            &roles,
            f.resource,
            &[ProjectAssignment { project: f.project.id, role: None }],
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "ConflictError");
    }

    #[tokio::test]
    async fn empty_targets_touch_nothing() {
        let f = fixture();
        f.store.fail_on("find_role_by_name");
        f.store.fail_on("pull_project_resource");
        f.store.fail_on("delete_resource_teams");

        let mut session = f.store.begin().await.unwrap();
        add_to_projects(session.as_mut(), &f.roles, f.resource, &[]).await.unwrap();
        remove_from_projects(session.as_mut(), f.resource, &[]).await.unwrap();
        remove_from_streams_and_teams(session.as_mut(), f.resource, &[]).await.unwrap();
        add_to_streams_and_teams(session.as_mut(), &f.roles, f.resource, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn remove_from_all_clears_every_reference() {
        let f = fixture();
        let mut session = f.store.begin().await.unwrap();
        add_to_streams_and_teams(
            session.as_mut(),
            &f.roles,
            f.resource,
            &[
                StreamAssignment::new(f.stream.id, Some("lead")),
                StreamAssignment::new(f.stream.id, None),
            ],
        )
        .await
        .unwrap();
        add_to_projects(
            session.as_mut(),
            &f.roles,
            f.resource,
            &[ProjectAssignment { project: f.project.id, role: Some(f.manager.id) }],
        )
        .await
        .unwrap();

        remove_from_all_by_resource(session.as_mut(), f.resource).await.unwrap();
        session.commit().await.unwrap();

        let state = f.store.snapshot().await;
        assert!(!state.streams[0].references(&f.resource));
        assert!(state.teams.is_empty());
        assert!(!state.projects[0].references(&f.resource));
    }

    #[tokio::test]
    async fn approvals_update_bucket_entries_and_teams() {
        let f = fixture();
        let approver = ObjectId::new();
        let mut session = f.store.begin().await.unwrap();
        add_to_streams_and_teams(
            session.as_mut(),
            &f.roles,
            f.resource,
            &[
                StreamAssignment::new(f.stream.id, Some("lead")),
                StreamAssignment::new(f.stream.id, Some("TEAM")),
            ],
        )
        .await
        .unwrap();

        let change = |role: &str| ApprovalChange {
            resource: f.resource,
            stream: f.stream.id,
            role: Some(role.to_string()),
            is_approved: true,
            approved_by: Some(approver),
        };
        set_stream_approvals(session.as_mut(), &f.roles, &[change("lead"), change("TEAM")])
            .await
            .unwrap();
        session.commit().await.unwrap();

        let state = f.store.snapshot().await;
        assert!(state.streams[0].lead[0].is_approved);
        assert_eq!(state.streams[0].lead[0].approved_by, Some(approver));
        assert!(state.teams[0].is_approved);
    }
}
