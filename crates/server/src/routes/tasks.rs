//! Routes for tasks, their comments and attachments, and the deadline
//! reminder trigger.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{
    activity_log::{ActionType, ActivityLog, CreateActivityLog},
    attachment::{CreateTaskAttachment, TaskAttachment},
    comment::{CreateTaskComment, TaskComment},
    project::Project,
    task::{CreateTask, DueTask, Task, UpdateTask},
};
use serde::Deserialize;
use services::services::{
    reminder::{self, DEFAULT_DAYS_AHEAD, GroupReminderResult},
    task_lifecycle,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::{ApiError, Json}};

pub async fn get_tasks_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_project_id(&state.db.pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_tasks_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_assignee(&state.db.pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

#[derive(Debug, Deserialize)]
pub struct NearDeadlineQuery {
    pub days: Option<u32>,
}

pub async fn get_tasks_near_deadline(
    State(state): State<AppState>,
    Query(query): Query<NearDeadlineQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<DueTask>>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_DAYS_AHEAD);
    let tasks = Task::find_near_deadline(&state.db.pool, days).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or(ApiError::TaskNotFound)?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("task name is required".to_string()));
    }
    Project::find_by_id(&state.db.pool, payload.project_id)
        .await?
        .ok_or(ApiError::ProjectNotFound)?;

    let task = Task::create(&state.db.pool, &payload).await?;

    let log = CreateActivityLog {
        project_id: task.project_id,
        task_id: Some(task.id),
        user_id: task.created_by,
        action_type: ActionType::Created,
        description: format!("Task '{}' created", task.name),
        old_value: None,
        new_value: Some(task.status.to_string()),
    };
    if let Err(e) = ActivityLog::create(&state.db.pool, &log).await {
        tracing::error!(task_id = %task.id, error = %e, "failed to write creation log");
    }

    Ok(ResponseJson(ApiResponse::success(task)))
}

/// Partial update. Status changes flow through the lifecycle service, which
/// appends the audit row and enqueues the debounced notification.
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task =
        task_lifecycle::update_task(&state.db.pool, &state.transitions, task_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = Task::delete(&state.db.pool, task_id).await?;
    if rows == 0 {
        return Err(ApiError::TaskNotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct SendRemindersRequest {
    pub days: Option<u32>,
}

/// Manual trigger for the deadline reminder sweep, mirroring what the
/// background scheduler does on its interval.
pub async fn send_deadline_reminders(
    State(state): State<AppState>,
    Json(payload): Json<SendRemindersRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<GroupReminderResult>>>, ApiError> {
    let days = payload.days.unwrap_or(DEFAULT_DAYS_AHEAD);
    let results = reminder::send_due_reminders(&state.db.pool, &state.notifications, days).await?;
    Ok(ResponseJson(ApiResponse::success(results)))
}

pub async fn get_task_comments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskComment>>>, ApiError> {
    let comments = TaskComment::find_by_task_id(&state.db.pool, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn create_task_comment(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CreateTaskComment>,
) -> Result<ResponseJson<ApiResponse<TaskComment>>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "comment content is required".to_string(),
        ));
    }
    let task = Task::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or(ApiError::TaskNotFound)?;

    let comment = TaskComment::create(&state.db.pool, task_id, &payload).await?;

    let log = CreateActivityLog {
        project_id: task.project_id,
        task_id: Some(task_id),
        user_id: payload.user_id,
        action_type: ActionType::Commented,
        description: format!("Comment added to task '{}'", task.name),
        old_value: None,
        new_value: None,
    };
    if let Err(e) = ActivityLog::create(&state.db.pool, &log).await {
        tracing::error!(task_id = %task_id, error = %e, "failed to write comment log");
    }

    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn get_task_attachments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskAttachment>>>, ApiError> {
    let attachments = TaskAttachment::find_by_task_id(&state.db.pool, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(attachments)))
}

pub async fn create_task_attachment(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CreateTaskAttachment>,
) -> Result<ResponseJson<ApiResponse<TaskAttachment>>, ApiError> {
    if payload.file_name.trim().is_empty() || payload.file_url.trim().is_empty() {
        return Err(ApiError::Validation(
            "file_name and file_url are required".to_string(),
        ));
    }
    let task = Task::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or(ApiError::TaskNotFound)?;

    let attachment = TaskAttachment::create(&state.db.pool, task_id, &payload).await?;

    let log = CreateActivityLog {
        project_id: task.project_id,
        task_id: Some(task_id),
        user_id: payload.uploaded_by,
        action_type: ActionType::FileUploaded,
        description: format!("File '{}' attached to task '{}'", payload.file_name, task.name),
        old_value: None,
        new_value: Some(payload.file_url.clone()),
    };
    if let Err(e) = ActivityLog::create(&state.db.pool, &log).await {
        tracing::error!(task_id = %task_id, error = %e, "failed to write attachment log");
    }

    Ok(ResponseJson(ApiResponse::success(attachment)))
}

pub async fn delete_task_attachment(
    State(state): State<AppState>,
    Path(attachment_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = TaskAttachment::delete(&state.db.pool, attachment_id).await?;
    if rows == 0 {
        return Err(ApiError::AttachmentNotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/tasks",
        Router::new()
            .route("/", post(create_task))
            .route("/near-deadline", get(get_tasks_near_deadline))
            .route("/send-deadline-reminders", post(send_deadline_reminders))
            .route("/project/{project_id}", get(get_tasks_by_project))
            .route("/user/{user_id}", get(get_tasks_by_user))
            .route("/{id}", get(get_task).put(update_task).delete(delete_task))
            .route(
                "/{id}/comments",
                get(get_task_comments).post(create_task_comment),
            )
            .route(
                "/{id}/attachments",
                get(get_task_attachments).post(create_task_attachment),
            )
            .route(
                "/attachments/{attachment_id}",
                delete(delete_task_attachment),
            ),
    )
}
