use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTaskComment {
    pub user_id: Option<Uuid>,
    pub content: String,
}

impl TaskComment {
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateTaskComment,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, TaskComment>(
            r#"INSERT INTO task_comments (id, task_id, user_id, content)
               VALUES ($1, $2, $3, $4)
               RETURNING id, task_id, user_id, content, created_at"#,
        )
        .bind(id)
        .bind(task_id)
        .bind(data.user_id)
        .bind(&data.content)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(
            "SELECT id, task_id, user_id, content, created_at FROM task_comments WHERE task_id = $1 ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
