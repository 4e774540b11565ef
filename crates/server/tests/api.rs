//! End-to-end router tests against an in-memory database.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::DBService;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, app_router};
use services::services::{
    config::Config,
    messaging::{MessagePush, MessagingError},
    notification::NotificationService,
    transition_queue::TransitionQueue,
};
use tower::ServiceExt;

struct NoopPusher;

#[async_trait]
impl MessagePush for NoopPusher {
    async fn push(&self, _to: &str, _messages: Vec<Value>) -> Result<(), MessagingError> {
        Ok(())
    }
}

async fn test_app() -> Router {
    let db = DBService::new_in_memory().await.unwrap();
    let notifications =
        NotificationService::new(Arc::new(NoopPusher), "https://liff.example".to_string());
    let (transitions, _worker) =
        TransitionQueue::spawn(db.clone(), notifications.clone(), Duration::from_millis(10));
    let config = Arc::new(Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        line_channel_access_token: None,
        liff_url: "https://liff.example".to_string(),
    });
    app_router(AppState {
        db,
        notifications,
        transitions,
        config,
    })
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app().await;
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn user_upsert_roundtrip() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users",
        Some(json!({"line_user_id": "U1", "display_name": "Mint", "picture_url": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    // Same line_user_id updates in place instead of inserting a second row.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users",
        Some(json!({"line_user_id": "U1", "display_name": "Minty", "picture_url": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id.as_str());
    assert_eq!(body["data"]["display_name"], "Minty");

    let (status, body) = send_json(&app, "GET", &format!("/api/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "Minty");
}

#[tokio::test]
async fn upsert_rejects_blank_line_user_id() {
    let app = test_app().await;
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users",
        Some(json!({"line_user_id": "  ", "display_name": "Mint", "picture_url": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn project_create_requires_existing_group() {
    let app = test_app().await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/projects",
        Some(json!({
            "group_id": uuid::Uuid::new_v4(),
            "name": "Orphan",
            "description": null,
            "start_date": null,
            "end_date": null,
            "created_by": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_project_per_group_is_rejected() {
    let app = test_app().await;

    let (_, user) = send_json(
        &app,
        "POST",
        "/api/users",
        Some(json!({"line_user_id": "U1", "display_name": "Mint", "picture_url": null})),
    )
    .await;
    let user_id = user["data"]["id"].as_str().unwrap().to_string();

    let (status, group) = send_json(
        &app,
        "POST",
        "/api/groups",
        Some(json!({"line_group_id": "C1", "name": "Team", "created_by": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = group["data"]["id"].as_str().unwrap().to_string();

    let project = json!({
        "group_id": group_id,
        "name": "Launch",
        "description": null,
        "start_date": null,
        "end_date": null,
        "created_by": user_id
    });
    let (status, _) = send_json(&app, "POST", "/api/projects", Some(project.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, "POST", "/api/projects", Some(project)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "group already has a project");
}

#[tokio::test]
async fn task_crud_and_unknown_status_rejection() {
    let app = test_app().await;

    let (_, user) = send_json(
        &app,
        "POST",
        "/api/users",
        Some(json!({"line_user_id": "U1", "display_name": "Mint", "picture_url": null})),
    )
    .await;
    let user_id = user["data"]["id"].as_str().unwrap().to_string();
    let (_, group) = send_json(
        &app,
        "POST",
        "/api/groups",
        Some(json!({"line_group_id": "C1", "name": "Team", "created_by": user_id})),
    )
    .await;
    let group_id = group["data"]["id"].as_str().unwrap().to_string();
    let (_, project) = send_json(
        &app,
        "POST",
        "/api/projects",
        Some(json!({
            "group_id": group_id,
            "name": "Launch",
            "description": null,
            "start_date": null,
            "end_date": null,
            "created_by": user_id
        })),
    )
    .await;
    let project_id = project["data"]["id"].as_str().unwrap().to_string();

    let (status, task) = send_json(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({
            "project_id": project_id,
            "name": "Design review",
            "description": null,
            "status": null,
            "phase": null,
            "deadline": null,
            "assigned_to": null,
            "created_by": user_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["data"]["status"], "todo");
    let task_id = task["data"]["id"].as_str().unwrap().to_string();

    // "pending" is accepted as a legacy alias for todo.
    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(json!({"status": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Anything outside the closed status set is rejected at the edge, and
    // the rejection still uses the standard response envelope.
    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(json!({"status": "half_done"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("half_done"));

    let (status, _) = send_json(&app, "DELETE", &format!("/api/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&app, "GET", &format!("/api/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_of_missing_task_is_not_found() {
    let app = test_app().await;
    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/tasks/{}", uuid::Uuid::new_v4()),
        Some(json!({"name": "renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
