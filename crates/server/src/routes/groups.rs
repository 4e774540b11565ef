//! Routes for chat groups and their memberships.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{
    group::{CreateGroup, Group, GroupMember, GroupMemberDetail, UpdateGroup},
    user::User,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::{ApiError, Json}};

pub async fn get_groups(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Group>>>, ApiError> {
    let groups = Group::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(groups)))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Group>>, ApiError> {
    let group = Group::find_by_id(&state.db.pool, group_id)
        .await?
        .ok_or(ApiError::GroupNotFound)?;
    Ok(ResponseJson(ApiResponse::success(group)))
}

pub async fn get_group_by_line_id(
    State(state): State<AppState>,
    Path(line_group_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Group>>, ApiError> {
    let group = Group::find_by_line_group_id(&state.db.pool, &line_group_id)
        .await?
        .ok_or(ApiError::GroupNotFound)?;
    Ok(ResponseJson(ApiResponse::success(group)))
}

/// Register a chat group. The creator is enrolled as the first member with
/// the admin role.
pub async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroup>,
) -> Result<ResponseJson<ApiResponse<Group>>, ApiError> {
    if payload.line_group_id.trim().is_empty() {
        return Err(ApiError::Validation(
            "line_group_id is required".to_string(),
        ));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("group name is required".to_string()));
    }
    User::find_by_id(&state.db.pool, payload.created_by)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let group = Group::create(&state.db.pool, &payload).await?;
    GroupMember::add(&state.db.pool, group.id, payload.created_by, "admin").await?;

    Ok(ResponseJson(ApiResponse::success(group)))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateGroup>,
) -> Result<ResponseJson<ApiResponse<Group>>, ApiError> {
    let group = Group::update(&state.db.pool, group_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(group)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = Group::delete(&state.db.pool, group_id).await?;
    if rows == 0 {
        return Err(ApiError::GroupNotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_group_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<GroupMemberDetail>>>, ApiError> {
    Group::find_by_id(&state.db.pool, group_id)
        .await?
        .ok_or(ApiError::GroupNotFound)?;
    let members = GroupMember::find_by_group_id(&state.db.pool, group_id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: Option<String>,
}

/// Membership insert is an upsert: re-adding an existing member only
/// refreshes the role.
pub async fn add_group_member(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<ResponseJson<ApiResponse<GroupMember>>, ApiError> {
    Group::find_by_id(&state.db.pool, group_id)
        .await?
        .ok_or(ApiError::GroupNotFound)?;
    User::find_by_id(&state.db.pool, payload.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let role = payload.role.as_deref().unwrap_or("member");
    let member = GroupMember::add(&state.db.pool, group_id, payload.user_id, role).await?;
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn remove_group_member(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = GroupMember::remove(&state.db.pool, group_id, user_id).await?;
    if rows == 0 {
        return Err(ApiError::MemberNotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/groups",
        Router::new()
            .route("/", get(get_groups).post(create_group))
            .route("/by-line/{line_group_id}", get(get_group_by_line_id))
            .route(
                "/{id}",
                get(get_group).put(update_group).delete(delete_group),
            )
            .route(
                "/{id}/members",
                get(get_group_members).post(add_group_member),
            )
            .route("/{id}/members/{user_id}", delete(remove_group_member)),
    )
}
