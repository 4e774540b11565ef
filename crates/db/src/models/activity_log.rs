use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    Created,
    StatusChange,
    Commented,
    FileUploaded,
    Deleted,
}

/// Append-only audit record. The core workflow never updates or deletes rows.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action_type: ActionType,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Log row joined with the actor's display name, for the report timeline.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct ActivityLogDetail {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub action_type: ActionType,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateActivityLog {
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action_type: ActionType,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

const LOG_COLUMNS: &str =
    "id, project_id, task_id, user_id, action_type, description, old_value, new_value, created_at";

impl ActivityLog {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateActivityLog,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ActivityLog>(&format!(
            r#"INSERT INTO activity_logs (id, project_id, task_id, user_id, action_type, description, old_value, new_value)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {LOG_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.project_id)
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.action_type)
        .bind(&data.description)
        .bind(&data.old_value)
        .bind(&data.new_value)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM activity_logs WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(project_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_detailed_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogDetail>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLogDetail>(
            r#"SELECT
                 l.id, l.task_id, l.action_type, l.description,
                 l.old_value, l.new_value,
                 u.display_name AS actor_name,
                 l.created_at
               FROM activity_logs l
               LEFT JOIN users u ON u.id = l.user_id
               WHERE l.project_id = $1
               ORDER BY l.created_at DESC
               LIMIT $2"#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM activity_logs WHERE task_id = $1 ORDER BY created_at DESC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
