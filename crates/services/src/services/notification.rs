//! Builds flex-message cards for domain events and dispatches them to group
//! channels. Dispatch never fails past this boundary: failures are logged and
//! reported as an outcome flag.

use std::sync::Arc;

use db::models::{
    project::Project,
    task::{DueTask, TaskStatus},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::messaging::MessagePush;

/// Domain events that produce an outbound card.
#[derive(Debug, Clone)]
pub enum Notification {
    ProjectCreated {
        project: Project,
    },
    TaskStatusChanged {
        project_id: Uuid,
        project_name: String,
        task_name: String,
        old_status: TaskStatus,
        new_status: TaskStatus,
        assignee_name: Option<String>,
        updated_by_name: Option<String>,
    },
    /// Batches several due tasks into one carousel message.
    DeadlineReminder { tasks: Vec<DueTask> },
    ProjectCompleted {
        project_id: Uuid,
        project_name: String,
        total_tasks: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent,
    /// No channel configured; the send is silently skipped.
    Skipped,
    Failed,
}

#[derive(Clone)]
pub struct NotificationService {
    pusher: Arc<dyn MessagePush>,
    liff_url: String,
}

impl NotificationService {
    pub fn new(pusher: Arc<dyn MessagePush>, liff_url: impl Into<String>) -> Self {
        Self {
            pusher,
            liff_url: liff_url.into(),
        }
    }

    /// Send one card to `channel`. An absent or empty channel is a no-op;
    /// delivery failures are logged and surfaced only as `Failed`.
    pub async fn notify(&self, channel: Option<&str>, notification: Notification) -> NotifyOutcome {
        let Some(channel) = channel.filter(|c| !c.is_empty()) else {
            debug!("notification skipped: no channel configured");
            return NotifyOutcome::Skipped;
        };

        let message = self.build_message(&notification);
        match self.pusher.push(channel, vec![message]).await {
            Ok(()) => NotifyOutcome::Sent,
            Err(e) => {
                warn!(channel = %channel, error = %e, "failed to push notification");
                NotifyOutcome::Failed
            }
        }
    }

    fn project_url(&self, project_id: Uuid) -> String {
        format!("{}/projectdetail/{}", self.liff_url, project_id)
    }

    fn build_message(&self, notification: &Notification) -> Value {
        match notification {
            Notification::ProjectCreated { project } => self.project_created_message(project),
            Notification::TaskStatusChanged {
                project_id,
                project_name,
                task_name,
                old_status,
                new_status,
                assignee_name,
                updated_by_name,
            } => self.status_changed_message(
                *project_id,
                project_name,
                task_name,
                *old_status,
                *new_status,
                assignee_name.as_deref(),
                updated_by_name.as_deref(),
            ),
            Notification::DeadlineReminder { tasks } => self.deadline_reminder_message(tasks),
            Notification::ProjectCompleted {
                project_id,
                project_name,
                total_tasks,
            } => self.project_completed_message(*project_id, project_name, *total_tasks),
        }
    }

    fn project_created_message(&self, project: &Project) -> Value {
        let mut body: Vec<Value> = vec![json!({
            "type": "text",
            "text": project.name,
            "weight": "bold",
            "size": "lg",
            "wrap": true
        })];
        if let Some(description) = &project.description {
            body.push(json!({
                "type": "text",
                "text": description,
                "size": "sm",
                "color": "#999999",
                "margin": "md",
                "wrap": true
            }));
        }
        body.push(json!({"type": "separator", "margin": "lg"}));

        let mut date_rows: Vec<Value> = Vec::new();
        if let Some(start) = project.start_date {
            date_rows.push(info_row("📅 Start:", &start.to_string()));
        }
        if let Some(end) = project.end_date {
            date_rows.push(info_row("🏁 End:", &end.to_string()));
        }
        body.push(json!({
            "type": "box",
            "layout": "vertical",
            "margin": "lg",
            "spacing": "sm",
            "contents": date_rows
        }));

        json!({
            "type": "flex",
            "altText": format!("🎉 Project \"{}\" created!", project.name),
            "contents": {
                "type": "bubble",
                "hero": hero("🎉 New project!", "#FFA500"),
                "body": {"type": "box", "layout": "vertical", "contents": body},
                "footer": footer_button("📋 View project", &self.project_url(project.id), "#FFA500")
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn status_changed_message(
        &self,
        project_id: Uuid,
        project_name: &str,
        task_name: &str,
        old_status: TaskStatus,
        new_status: TaskStatus,
        assignee_name: Option<&str>,
        updated_by_name: Option<&str>,
    ) -> Value {
        let old_meta = status_meta(old_status);
        let new_meta = status_meta(new_status);

        let mut rows = vec![
            json!({
                "type": "box",
                "layout": "horizontal",
                "contents": [
                    {"type": "text", "text": "Previous:", "size": "sm", "color": "#6B7280", "flex": 0},
                    {
                        "type": "text",
                        "text": format!("{} {}", old_meta.emoji, old_meta.label),
                        "size": "sm",
                        "color": "#9CA3AF",
                        "align": "end",
                        "decoration": "line-through"
                    }
                ]
            }),
            json!({
                "type": "box",
                "layout": "horizontal",
                "contents": [
                    {"type": "text", "text": "Now:", "size": "sm", "color": "#6B7280", "flex": 0},
                    {
                        "type": "text",
                        "text": format!("{} {}", new_meta.emoji, new_meta.label),
                        "size": "sm",
                        "color": new_meta.color,
                        "align": "end",
                        "weight": "bold"
                    }
                ]
            }),
        ];
        if let Some(assignee) = assignee_name {
            rows.push(info_row("Assignee:", assignee));
        }
        if let Some(updater) = updated_by_name {
            rows.push(info_row("Updated by:", updater));
        }

        json!({
            "type": "flex",
            "altText": format!("{} Task \"{}\" is now {}", new_meta.emoji, task_name, new_meta.label),
            "contents": {
                "type": "bubble",
                "hero": hero(&format!("{} Task status update", new_meta.emoji), new_meta.color),
                "body": {
                    "type": "box",
                    "layout": "vertical",
                    "contents": [
                        {"type": "text", "text": task_name, "weight": "bold", "size": "md", "wrap": true},
                        info_row("Project:", project_name),
                        {"type": "separator", "margin": "lg"},
                        {"type": "box", "layout": "vertical", "margin": "lg", "spacing": "sm", "contents": rows}
                    ]
                },
                "footer": footer_button("📋 View project", &self.project_url(project_id), new_meta.color)
            }
        })
    }

    fn deadline_reminder_message(&self, tasks: &[DueTask]) -> Value {
        let bubbles: Vec<Value> = tasks
            .iter()
            .map(|task| {
                let deadline = task
                    .deadline
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let mut rows = vec![
                    info_row("Project:", &task.project_name),
                    info_row("Due:", &deadline),
                ];
                if let Some(assignee) = &task.assignee_name {
                    rows.push(info_row("Assignee:", assignee));
                }
                json!({
                    "type": "bubble",
                    "hero": hero("⏰ Deadline approaching", "#EF4444"),
                    "body": {
                        "type": "box",
                        "layout": "vertical",
                        "contents": [
                            {"type": "text", "text": task.name, "weight": "bold", "size": "md", "wrap": true},
                            {"type": "box", "layout": "vertical", "margin": "lg", "spacing": "sm", "contents": rows}
                        ]
                    },
                    "footer": footer_button("📋 View project", &self.project_url(task.project_id), "#EF4444")
                })
            })
            .collect();

        json!({
            "type": "flex",
            "altText": format!("⏰ {} task(s) near deadline", tasks.len()),
            "contents": {"type": "carousel", "contents": bubbles}
        })
    }

    fn project_completed_message(
        &self,
        project_id: Uuid,
        project_name: &str,
        total_tasks: usize,
    ) -> Value {
        json!({
            "type": "flex",
            "altText": format!("🏆 Project \"{}\" completed!", project_name),
            "contents": {
                "type": "bubble",
                "hero": hero("🏆 Project completed!", "#10B981"),
                "body": {
                    "type": "box",
                    "layout": "vertical",
                    "contents": [
                        {"type": "text", "text": project_name, "weight": "bold", "size": "lg", "wrap": true},
                        {
                            "type": "text",
                            "text": format!("All {} task(s) are done. Great work, team! 🎉", total_tasks),
                            "size": "sm",
                            "color": "#555555",
                            "margin": "md",
                            "wrap": true
                        }
                    ]
                },
                "footer": footer_button("📋 View project", &self.project_url(project_id), "#10B981")
            }
        })
    }
}

struct StatusMeta {
    emoji: &'static str,
    label: &'static str,
    color: &'static str,
}

/// Display metadata is total over the closed status set; there is no
/// unknown-string fallback because unknown strings never get this far.
fn status_meta(status: TaskStatus) -> StatusMeta {
    match status {
        TaskStatus::Todo => StatusMeta {
            emoji: "📝",
            label: "To do",
            color: "#999999",
        },
        TaskStatus::InProgress => StatusMeta {
            emoji: "🔄",
            label: "In progress",
            color: "#3B82F6",
        },
        TaskStatus::Reviewing => StatusMeta {
            emoji: "👀",
            label: "In review",
            color: "#8B5CF6",
        },
        TaskStatus::Submitted => StatusMeta {
            emoji: "⏳",
            label: "Awaiting approval",
            color: "#F59E0B",
        },
        TaskStatus::Completed => StatusMeta {
            emoji: "✅",
            label: "Completed",
            color: "#10B981",
        },
    }
}

fn hero(title: &str, color: &str) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            {"type": "text", "text": title, "weight": "bold", "size": "lg", "color": "#FFFFFF"}
        ],
        "backgroundColor": color,
        "paddingAll": "15px"
    })
}

fn info_row(label: &str, value: &str) -> Value {
    json!({
        "type": "box",
        "layout": "horizontal",
        "contents": [
            {"type": "text", "text": label, "size": "sm", "color": "#6B7280", "flex": 0},
            {"type": "text", "text": value, "size": "sm", "color": "#374151", "align": "end", "wrap": true}
        ]
    })
}

fn footer_button(label: &str, uri: &str, color: &str) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            {
                "type": "button",
                "style": "primary",
                "action": {"type": "uri", "label": label, "uri": uri},
                "color": color,
                "height": "sm"
            }
        ]
    })
}
