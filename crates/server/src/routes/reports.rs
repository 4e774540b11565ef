//! Routes for the aggregated project report.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use services::services::report::{self, ProjectReport};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// One-fetch aggregate of a project: metadata, members, tasks oldest-first,
/// and the recent activity timeline.
pub async fn get_project_report(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ProjectReport>>, ApiError> {
    let report = report::project_report(&state.db.pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/{project_id}", get(get_project_report))
}
