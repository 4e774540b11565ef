//! Project completion evaluation: promotes a project to its terminal
//! `achieved` state once every task is completed.

use db::models::{
    group::Group,
    project::{Project, ProjectStatus},
    task::Task,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::notification::{Notification, NotificationService};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// A project with no tasks is never auto-completed.
    NoTasks,
    Pending { completed: usize, total: usize },
    Achieved { total_tasks: usize },
}

/// Read-all-sibling-tasks-and-decide. No memoized state: safe to invoke on
/// every completing transition. The achieved write is unconditional, so a
/// second call on an already-achieved project rewrites the same value (and
/// may send a duplicate card, which callers accept).
pub async fn evaluate(
    pool: &SqlitePool,
    notifications: &NotificationService,
    project_id: Uuid,
) -> Result<CompletionOutcome, CompletionError> {
    let tasks = Task::find_by_project_id(pool, project_id).await?;

    if tasks.is_empty() {
        debug!(project_id = %project_id, "completion check: project has no tasks");
        return Ok(CompletionOutcome::NoTasks);
    }

    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.status.is_terminal()).count();
    if completed < total {
        debug!(
            project_id = %project_id,
            completed = completed,
            total = total,
            "completion check: not all tasks completed"
        );
        return Ok(CompletionOutcome::Pending { completed, total });
    }

    let project = Project::set_status(pool, project_id, ProjectStatus::Achieved)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => CompletionError::ProjectNotFound(project_id),
            e => CompletionError::Database(e),
        })?;

    info!(project_id = %project_id, total_tasks = total, "project achieved");

    let group = Group::find_by_id(pool, project.group_id).await?;
    let channel = group.and_then(|g| g.line_group_id);
    notifications
        .notify(
            channel.as_deref(),
            Notification::ProjectCompleted {
                project_id: project.id,
                project_name: project.name.clone(),
                total_tasks: total,
            },
        )
        .await;

    Ok(CompletionOutcome::Achieved { total_tasks: total })
}

#[cfg(test)]
mod tests {
    use db::models::task::TaskStatus;

    use super::*;
    use crate::services::test_support;

    #[tokio::test]
    async fn zero_tasks_is_never_achieved() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C9")).await;

        let outcome = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();

        assert_eq!(outcome, CompletionOutcome::NoTasks);
        let project = Project::find_by_id(&db.pool, ids.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(pusher.pushes().is_empty());
    }

    #[tokio::test]
    async fn mixed_statuses_stay_pending_with_no_writes() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C9")).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::InProgress).await;

        let outcome = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CompletionOutcome::Pending {
                completed: 2,
                total: 3
            }
        );
        let project = Project::find_by_id(&db.pool, ids.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(pusher.pushes().is_empty());
    }

    #[tokio::test]
    async fn all_completed_achieves_and_notifies_once() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C9")).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;

        let outcome = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();

        assert_eq!(outcome, CompletionOutcome::Achieved { total_tasks: 2 });
        let project = Project::find_by_id(&db.pool, ids.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Achieved);

        let pushes = pusher.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "C9");
    }

    #[tokio::test]
    async fn channelless_group_achieves_without_notification() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, None).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;

        let outcome = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();

        assert_eq!(outcome, CompletionOutcome::Achieved { total_tasks: 1 });
        assert!(pusher.pushes().is_empty());
    }

    #[tokio::test]
    async fn evaluation_is_reentrant_when_already_achieved() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C9")).await;
        test_support::seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;

        let first = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();
        let second = evaluate(&db.pool, &notifications, ids.project_id)
            .await
            .unwrap();

        assert_eq!(first, CompletionOutcome::Achieved { total_tasks: 1 });
        assert_eq!(second, CompletionOutcome::Achieved { total_tasks: 1 });
        let project = Project::find_by_id(&db.pool, ids.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Achieved);
        // Duplicate card on re-evaluation is the documented weak property.
        assert_eq!(pusher.pushes().len(), 2);
    }

    #[tokio::test]
    async fn unknown_project_with_completed_tasks_surfaces_not_found() {
        let (db, _pusher, notifications) = test_support::harness().await;
        let missing = uuid::Uuid::new_v4();
        let outcome = evaluate(&db.pool, &notifications, missing).await.unwrap();
        // No tasks exist for an unknown project, so it reports NoTasks
        // rather than erroring.
        assert_eq!(outcome, CompletionOutcome::NoTasks);
    }
}
