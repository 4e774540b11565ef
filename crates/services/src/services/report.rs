//! Denormalized project report: project, members, tasks, and activity logs
//! joined into one shape for rendering by the web client or a PDF pipeline.

use db::models::{
    activity_log::{ActivityLog, ActivityLogDetail},
    group::{GroupMember, GroupMemberDetail},
    project::Project,
    task::Task,
    user::User,
};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

const REPORT_LOG_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ProjectReport {
    pub project: Project,
    pub created_by_name: Option<String>,
    pub members: Vec<GroupMemberDetail>,
    pub tasks: Vec<Task>,
    pub logs: Vec<ActivityLogDetail>,
}

pub async fn project_report(
    pool: &SqlitePool,
    project_id: Uuid,
) -> Result<ProjectReport, ReportError> {
    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(ReportError::ProjectNotFound(project_id))?;

    let created_by_name = User::display_name(pool, project.created_by).await?;
    let members = GroupMember::find_by_group_id(pool, project.group_id).await?;
    let mut tasks = Task::find_by_project_id(pool, project_id).await?;
    tasks.reverse(); // oldest first for the report timeline
    let logs = ActivityLog::find_detailed_by_project_id(pool, project_id, REPORT_LOG_LIMIT).await?;

    Ok(ProjectReport {
        project,
        created_by_name,
        members,
        tasks,
        logs,
    })
}

#[cfg(test)]
mod tests {
    use db::models::task::TaskStatus;

    use super::*;
    use crate::services::test_support::{self, seed_task};

    #[tokio::test]
    async fn aggregates_project_members_tasks_and_logs() {
        let (db, _pusher, _notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C1")).await;
        GroupMember::add(&db.pool, ids.group_id, ids.user_id, "leader")
            .await
            .unwrap();
        seed_task(&db.pool, ids.project_id, TaskStatus::Todo).await;
        seed_task(&db.pool, ids.project_id, TaskStatus::InProgress).await;

        let report = project_report(&db.pool, ids.project_id).await.unwrap();

        assert_eq!(report.project.id, ids.project_id);
        assert_eq!(report.members.len(), 1);
        assert_eq!(report.members[0].display_name, "Mint");
        assert_eq!(report.tasks.len(), 2);
        assert!(report.logs.is_empty());
        assert_eq!(report.created_by_name.as_deref(), Some("Mint"));
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let (db, _pusher, _notifications) = test_support::harness().await;
        let err = project_report(&db.pool, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ReportError::ProjectNotFound(_)));
    }
}
