//! Deadline reminders: batches due tasks per group channel and sends one
//! carousel per group.

use std::collections::BTreeMap;

use db::models::task::Task;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::notification::{Notification, NotificationService, NotifyOutcome};

pub const DEFAULT_DAYS_AHEAD: u32 = 2;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct GroupReminderResult {
    pub channel: String,
    pub task_count: usize,
    pub outcome: NotifyOutcome,
}

/// Find open tasks due within `days_ahead` days, group them by their chat
/// channel, and push one batched reminder per channel. Tasks whose group has
/// no channel are skipped. Send failures are reported per group, never
/// propagated.
pub async fn send_due_reminders(
    pool: &SqlitePool,
    notifications: &NotificationService,
    days_ahead: u32,
) -> Result<Vec<GroupReminderResult>, ReminderError> {
    let due = Task::find_near_deadline(pool, days_ahead).await?;

    let mut by_channel: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for task in due {
        let Some(channel) = task.line_group_id.clone().filter(|c| !c.is_empty()) else {
            continue;
        };
        by_channel.entry(channel).or_default().push(task);
    }

    let mut results = Vec::with_capacity(by_channel.len());
    for (channel, tasks) in by_channel {
        let task_count = tasks.len();
        let outcome = notifications
            .notify(
                Some(&channel),
                Notification::DeadlineReminder { tasks },
            )
            .await;
        info!(
            channel = %channel,
            task_count = task_count,
            outcome = ?outcome,
            "deadline reminder dispatched"
        );
        results.push(GroupReminderResult {
            channel,
            task_count,
            outcome,
        });
    }

    Ok(results)
}
