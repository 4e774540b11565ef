//! Routes for users. Profiles sync from the chat client via upsert.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::{UpsertUser, User};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::{ApiError, Json}};

pub async fn get_users(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = User::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn get_user_by_line_id(
    State(state): State<AppState>,
    Path(line_user_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_line_user_id(&state.db.pool, &line_user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Create-or-refresh keyed by the chat platform user id. Re-running on every
/// login keeps display names and avatars current.
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(payload): Json<UpsertUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    if payload.line_user_id.trim().is_empty() {
        return Err(ApiError::Validation("line_user_id is required".to_string()));
    }
    if payload.display_name.trim().is_empty() {
        return Err(ApiError::Validation("display_name is required".to_string()));
    }
    let user = User::upsert(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users",
        Router::new()
            .route("/", get(get_users).post(upsert_user))
            .route("/by-line/{line_user_id}", get(get_user_by_line_id))
            .route("/{id}", get(get_user)),
    )
}
