use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub line_user_id: Option<String>,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserted by `line_user_id`: profile syncs from the chat client re-run on
/// every login.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpsertUser {
    pub line_user_id: String,
    pub display_name: String,
    pub picture_url: Option<String>,
}

const USER_COLUMNS: &str = "id, line_user_id, display_name, picture_url, created_at, updated_at";

impl User {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_line_user_id(
        pool: &SqlitePool,
        line_user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE line_user_id = $1"
        ))
        .bind(line_user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(pool: &SqlitePool, data: &UpsertUser) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, line_user_id, display_name, picture_url)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT(line_user_id) DO UPDATE SET
                   display_name = excluded.display_name,
                   picture_url = excluded.picture_url,
                   updated_at = datetime('now', 'subsec')
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.line_user_id)
        .bind(&data.display_name)
        .bind(&data.picture_url)
        .fetch_one(pool)
        .await
    }

    /// Display name lookup for notification cards; `None` when the id is
    /// absent or unknown.
    pub async fn display_name(
        pool: &SqlitePool,
        id: Option<Uuid>,
    ) -> Result<Option<String>, sqlx::Error> {
        let Some(id) = id else { return Ok(None) };
        let name: Option<(String,)> =
            sqlx::query_as("SELECT display_name FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(name.map(|(n,)| n))
    }
}
