use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A team chat group. `line_group_id` is the outbound notification channel;
/// when absent, sends addressed to this group are skipped.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Group {
    pub id: Uuid,
    pub line_group_id: Option<String>,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateGroup {
    pub line_group_id: String,
    pub name: String,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub line_group_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Member joined with user display data, for report aggregation and member
/// listings.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct GroupMemberDetail {
    pub user_id: Uuid,
    pub role: String,
    pub display_name: String,
    pub picture_url: Option<String>,
}

const GROUP_COLUMNS: &str = "id, line_group_id, name, created_by, created_at, updated_at";

impl Group {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_line_group_id(
        pool: &SqlitePool,
        line_group_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE line_group_id = $1"
        ))
        .bind(line_group_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateGroup) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Group>(&format!(
            r#"INSERT INTO groups (id, line_group_id, name, created_by)
               VALUES ($1, $2, $3, $4)
               RETURNING {GROUP_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.line_group_id)
        .bind(&data.name)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateGroup,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Group>(&format!(
            r#"UPDATE groups
               SET name = COALESCE($2, name),
                   line_group_id = COALESCE($3, line_group_id),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {GROUP_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.line_group_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl GroupMember {
    pub async fn add(
        pool: &SqlitePool,
        group_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, GroupMember>(
            r#"INSERT INTO group_members (id, group_id, user_id, role)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT(group_id, user_id) DO UPDATE SET role = excluded.role
               RETURNING id, group_id, user_id, role, joined_at"#,
        )
        .bind(id)
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn remove(
        pool: &SqlitePool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_group_id(
        pool: &SqlitePool,
        group_id: Uuid,
    ) -> Result<Vec<GroupMemberDetail>, sqlx::Error> {
        sqlx::query_as::<_, GroupMemberDetail>(
            r#"SELECT gm.user_id, gm.role, u.display_name, u.picture_url
               FROM group_members gm
               JOIN users u ON u.id = gm.user_id
               WHERE gm.group_id = $1
               ORDER BY gm.joined_at ASC"#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }
}
