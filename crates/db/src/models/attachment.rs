use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// URL metadata only; the files themselves live in external storage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskAttachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub uploaded_by: Option<Uuid>,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTaskAttachment {
    pub uploaded_by: Option<Uuid>,
    pub file_name: String,
    pub file_url: String,
}

impl TaskAttachment {
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateTaskAttachment,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, TaskAttachment>(
            r#"INSERT INTO task_attachments (id, task_id, uploaded_by, file_name, file_url)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, task_id, uploaded_by, file_name, file_url, uploaded_at"#,
        )
        .bind(id)
        .bind(task_id)
        .bind(data.uploaded_by)
        .bind(&data.file_name)
        .bind(&data.file_url)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskAttachment>(
            "SELECT id, task_id, uploaded_by, file_name, file_url, uploaded_at FROM task_attachments WHERE task_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
