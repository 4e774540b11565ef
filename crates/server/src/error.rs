use axum::{
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    reminder::ReminderError, report::ReportError, task_lifecycle::TaskLifecycleError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("task not found")]
    TaskNotFound,
    #[error("project not found")]
    ProjectNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("group not found")]
    GroupNotFound,
    #[error("attachment not found")]
    AttachmentNotFound,
    #[error("member not found")]
    MemberNotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<TaskLifecycleError> for ApiError {
    fn from(err: TaskLifecycleError) -> Self {
        match err {
            TaskLifecycleError::TaskNotFound(_) => ApiError::TaskNotFound,
            TaskLifecycleError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::ProjectNotFound(_) => ApiError::ProjectNotFound,
            ReportError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<ReminderError> for ApiError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::Database(e) => ApiError::Database(e),
        }
    }
}

/// Request-body extractor whose rejection is rendered through the
/// `ApiResponse` envelope instead of axum's plain-text default, so an
/// unknown enum value comes back as an enveloped validation error.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::TaskNotFound
            | ApiError::ProjectNotFound
            | ApiError::UserNotFound
            | ApiError::GroupNotFound
            | ApiError::AttachmentNotFound
            | ApiError::MemberNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "resource not found".to_string())
            }
            ApiError::Database(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, axum::Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
