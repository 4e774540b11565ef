use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Closed set of task states. Unknown strings are rejected at the API edge
/// during deserialization instead of flowing through as free text.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
    Default,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "pending")]
    Todo,
    InProgress,
    Reviewing,
    Submitted,
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Free-text grouping label ("phase 1", "design", ...).
    pub phase: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub phase: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Partial update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub phase: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    /// Attributed in the activity log only; not a task column.
    pub updated_by: Option<Uuid>,
}

/// A due task joined through its project to the group channel, used for
/// deadline reminders.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct DueTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub project_name: String,
    pub line_group_id: Option<String>,
    pub assignee_name: Option<String>,
}

const TASK_COLUMNS: &str = "id, project_id, name, description, status, phase, deadline, assigned_to, created_by, created_at, updated_at";

impl Task {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_assignee(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = $1 ORDER BY deadline ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Open tasks whose deadline falls within the next `days_ahead` days,
    /// joined to the project and group so callers know where to notify.
    pub async fn find_near_deadline(
        pool: &SqlitePool,
        days_ahead: u32,
    ) -> Result<Vec<DueTask>, sqlx::Error> {
        let upper = format!("+{days_ahead} days");
        sqlx::query_as::<_, DueTask>(
            r#"SELECT
                 t.id, t.project_id, t.name, t.status, t.deadline,
                 p.name AS project_name,
                 g.line_group_id,
                 u.display_name AS assignee_name
               FROM tasks t
               JOIN projects p ON p.id = t.project_id
               JOIN groups g ON g.id = p.group_id
               LEFT JOIN users u ON u.id = t.assigned_to
               WHERE t.status = 'todo'
                 AND t.deadline IS NOT NULL
                 AND date(t.deadline) >= date('now')
                 AND date(t.deadline) <= date('now', $1)
               ORDER BY t.deadline ASC"#,
        )
        .bind(upper)
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateTask) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let status = data.status.unwrap_or_default();
        sqlx::query_as::<_, Task>(&format!(
            r#"INSERT INTO tasks (id, project_id, name, description, status, phase, deadline, assigned_to, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.project_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(status)
        .bind(&data.phase)
        .bind(data.deadline)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Full-row write. Callers merge the patch over the previously-read row
    /// first; last write wins under concurrent updates.
    pub async fn update(pool: &SqlitePool, task: &Task) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks
               SET name = $2, description = $3, status = $4, phase = $5,
                   deadline = $6, assigned_to = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status)
        .bind(&task.phase)
        .bind(task.deadline)
        .bind(task.assigned_to)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl UpdateTask {
    /// Merge this patch over an existing row.
    pub fn apply_to(&self, task: &Task) -> Task {
        Task {
            name: self.name.clone().unwrap_or_else(|| task.name.clone()),
            description: self.description.clone().or_else(|| task.description.clone()),
            status: self.status.unwrap_or(task.status),
            phase: self.phase.clone().or_else(|| task.phase.clone()),
            deadline: self.deadline.or(task.deadline),
            assigned_to: self.assigned_to.or(task.assigned_to),
            ..task.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_form_is_snake_case() {
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"in_progress\"").unwrap(),
            TaskStatus::InProgress
        );
    }

    #[test]
    fn pending_is_accepted_as_todo() {
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"pending\"").unwrap(),
            TaskStatus::Todo
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<TaskStatus>("\"doneish\"").is_err());
    }
}
