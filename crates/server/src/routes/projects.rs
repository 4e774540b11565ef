//! Routes for projects and their activity log timeline.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    activity_log::{ActionType, ActivityLog, CreateActivityLog},
    group::Group,
    project::{CreateProject, Project, UpdateProject},
    task::Task,
};
use serde::Serialize;
use services::services::notification::Notification;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::{ApiError, Json}};

/// Project detail with its tasks inlined, matching what the board view
/// renders in one fetch.
#[derive(Debug, Clone, Serialize, TS)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

pub async fn get_projects_by_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_by_group_id(&state.db.pool, group_id).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ProjectWithTasks>>, ApiError> {
    let project = Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::ProjectNotFound)?;
    let tasks = Task::find_by_project_id(&state.db.pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(ProjectWithTasks {
        project,
        tasks,
    })))
}

pub async fn get_project_logs(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::ProjectNotFound)?;
    let logs = ActivityLog::find_by_project_id(&state.db.pool, project_id, 100).await?;
    Ok(ResponseJson(ApiResponse::success(logs)))
}

/// Create a project. Each group carries at most one active project, so a
/// second create for the same group is rejected up front.
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("project name is required".to_string()));
    }
    let group = Group::find_by_id(&state.db.pool, payload.group_id)
        .await?
        .ok_or(ApiError::GroupNotFound)?;
    if Project::find_one_by_group_id(&state.db.pool, payload.group_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(
            "group already has a project".to_string(),
        ));
    }

    let project = Project::create(&state.db.pool, &payload).await?;

    let log = CreateActivityLog {
        project_id: project.id,
        task_id: None,
        user_id: project.created_by,
        action_type: ActionType::Created,
        description: format!("Project '{}' created", project.name),
        old_value: None,
        new_value: None,
    };
    if let Err(e) = ActivityLog::create(&state.db.pool, &log).await {
        tracing::error!(project_id = %project.id, error = %e, "failed to write creation log");
    }

    state
        .notifications
        .notify(
            group.line_group_id.as_deref(),
            Notification::ProjectCreated {
                project: project.clone(),
            },
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::update(&state.db.pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = Project::delete(&state.db.pool, project_id).await?;
    if rows == 0 {
        return Err(ApiError::ProjectNotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/projects",
        Router::new()
            .route("/", axum::routing::post(create_project))
            .route("/group/{group_id}", get(get_projects_by_group))
            .route(
                "/{id}",
                get(get_project).put(update_project).delete(delete_project),
            )
            .route("/{id}/logs", get(get_project_logs)),
    )
}
