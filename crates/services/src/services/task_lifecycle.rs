//! The task update workflow: read old state, persist the patch, audit the
//! status transition, and hand the notification/completion side effects to
//! the transition queue.

use db::models::{
    activity_log::{ActionType, ActivityLog, CreateActivityLog},
    task::{Task, UpdateTask},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::transition_queue::{TaskTransition, TransitionQueueHandle};

#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Apply a partial update to a task.
///
/// Iff the patch carries a status different from the previously-read one,
/// an audit row is appended and a transition job is enqueued. Both side
/// effects are isolated: a failed log write or a closed queue is logged and
/// never fails the update. The read-modify-write is unguarded; under two
/// concurrent updates the last write wins.
pub async fn update_task(
    pool: &SqlitePool,
    queue: &TransitionQueueHandle,
    task_id: Uuid,
    data: &UpdateTask,
) -> Result<Task, TaskLifecycleError> {
    let old = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(TaskLifecycleError::TaskNotFound(task_id))?;

    let merged = data.apply_to(&old);
    let updated = Task::update(pool, &merged).await?;

    if let Some(new_status) = data.status
        && new_status != old.status
    {
        info!(
            task_id = %task_id,
            old_status = %old.status,
            new_status = %new_status,
            "task status transition"
        );

        // Attribution falls back to the task's assignee when the request
        // carries no updated_by.
        let actor = data.updated_by.or(updated.assigned_to);
        let log = CreateActivityLog {
            project_id: old.project_id,
            task_id: Some(task_id),
            user_id: actor,
            action_type: ActionType::StatusChange,
            description: format!("Status changed from {} to {}", old.status, new_status),
            old_value: Some(old.status.to_string()),
            new_value: Some(new_status.to_string()),
        };
        if let Err(e) = ActivityLog::create(pool, &log).await {
            // The status update must still succeed when audit logging fails.
            error!(task_id = %task_id, error = %e, "failed to write activity log");
        }

        queue.enqueue(TaskTransition {
            task_id,
            project_id: old.project_id,
            old_status: old.status,
            new_status,
            changed_by: actor,
        });
    }

    Ok(updated)
}
