//! Shared fixtures for service tests: an in-memory database and a recording
//! push sink.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use db::{
    DBService,
    models::{
        group::{CreateGroup, Group},
        project::{CreateProject, Project},
        task::{CreateTask, Task, TaskStatus},
        user::{UpsertUser, User},
    },
};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    messaging::{MessagePush, MessagingError},
    notification::NotificationService,
};

/// Records every push instead of hitting the network.
#[derive(Default)]
pub struct RecordingPusher {
    pushes: Mutex<Vec<(String, Vec<Value>)>>,
    fail: bool,
}

impl RecordingPusher {
    pub fn failing() -> Self {
        Self {
            pushes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn pushes(&self) -> Vec<(String, Vec<Value>)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePush for RecordingPusher {
    async fn push(&self, to: &str, messages: Vec<Value>) -> Result<(), MessagingError> {
        if self.fail {
            return Err(MessagingError::Http {
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        self.pushes
            .lock()
            .unwrap()
            .push((to.to_string(), messages));
        Ok(())
    }
}

pub async fn harness() -> (DBService, Arc<RecordingPusher>, NotificationService) {
    let db = DBService::new_in_memory().await.expect("in-memory db");
    let pusher = Arc::new(RecordingPusher::default());
    let notifications = NotificationService::new(pusher.clone(), "https://liff.example");
    (db, pusher, notifications)
}

pub struct SeededProject {
    pub group_id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
}

/// Seed a user, a group (optionally with a chat channel), and one project.
pub async fn seed_project(pool: &SqlitePool, line_group_id: Option<&str>) -> SeededProject {
    let user = User::upsert(
        pool,
        &UpsertUser {
            line_user_id: format!("U{}", Uuid::new_v4().simple()),
            display_name: "Mint".to_string(),
            picture_url: None,
        },
    )
    .await
    .expect("seed user");

    let group = Group::create(
        pool,
        &CreateGroup {
            line_group_id: line_group_id.unwrap_or("").to_string(),
            name: "Team".to_string(),
            created_by: user.id,
        },
    )
    .await
    .expect("seed group");
    if line_group_id.is_none() {
        sqlx::query("UPDATE groups SET line_group_id = NULL WHERE id = $1")
            .bind(group.id)
            .execute(pool)
            .await
            .expect("clear channel");
    }

    let project = Project::create(
        pool,
        &CreateProject {
            group_id: group.id,
            name: "Senior project".to_string(),
            description: None,
            start_date: None,
            end_date: None,
            created_by: Some(user.id),
        },
    )
    .await
    .expect("seed project");

    SeededProject {
        group_id: group.id,
        project_id: project.id,
        user_id: user.id,
    }
}

pub async fn seed_task(pool: &SqlitePool, project_id: Uuid, status: TaskStatus) -> Task {
    Task::create(
        pool,
        &CreateTask {
            project_id,
            name: "task".to_string(),
            description: None,
            status: Some(status),
            phase: None,
            deadline: None,
            assigned_to: None,
            created_by: None,
        },
    )
    .await
    .expect("seed task")
}
