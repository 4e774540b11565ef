//! Debounced handoff for status-transition side effects.
//!
//! The update handler enqueues a job per transition and returns immediately;
//! a single-consumer worker coalesces jobs for the same task inside a short
//! window, then sends at most one status card reflecting the final state and
//! runs the completion check when that state is terminal. This replaces an
//! ad hoc timer delay with an explicit, testable queueing contract.

use std::collections::HashMap;
use std::time::Duration;

use db::{
    DBService,
    models::{group::Group, project::Project, task::{Task, TaskStatus}, user::User},
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{
    completion,
    notification::{Notification, NotificationService},
};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// One status transition observed by the update path.
#[derive(Debug, Clone)]
pub struct TaskTransition {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub old_status: TaskStatus,
    pub new_status: TaskStatus,
    pub changed_by: Option<Uuid>,
}

/// Cheap clonable handle; enqueueing never blocks and never fails the caller.
#[derive(Clone)]
pub struct TransitionQueueHandle {
    tx: mpsc::UnboundedSender<TaskTransition>,
}

impl TransitionQueueHandle {
    pub fn enqueue(&self, transition: TaskTransition) {
        if let Err(e) = self.tx.send(transition) {
            // Worker gone (shutdown); the primary update already succeeded.
            warn!(error = %e, "transition queue closed, dropping side effects");
        }
    }
}

struct PendingTransition {
    /// Oldest status seen in this window.
    old_status: TaskStatus,
    /// Latest status seen in this window.
    new_status: TaskStatus,
    changed_by: Option<Uuid>,
    due: Instant,
}

pub struct TransitionQueue {
    db: DBService,
    notifications: NotificationService,
    window: Duration,
}

impl TransitionQueue {
    /// Spawn the single-consumer worker. Dropping every handle drains the
    /// remaining pending entries and stops the worker.
    pub fn spawn(
        db: DBService,
        notifications: NotificationService,
        window: Duration,
    ) -> (TransitionQueueHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            db,
            notifications,
            window,
        };
        let handle = tokio::spawn(queue.run(rx));
        (TransitionQueueHandle { tx }, handle)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<TaskTransition>) {
        let mut pending: HashMap<Uuid, PendingTransition> = HashMap::new();

        loop {
            let next_due = pending.values().map(|p| p.due).min();
            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Some(transition) => self.absorb(&mut pending, transition),
                        None => break,
                    }
                }
                _ = async { sleep_until(next_due.unwrap()).await }, if next_due.is_some() => {
                    let now = Instant::now();
                    let due: Vec<Uuid> = pending
                        .iter()
                        .filter(|(_, p)| p.due <= now)
                        .map(|(id, _)| *id)
                        .collect();
                    for task_id in due {
                        if let Some(entry) = pending.remove(&task_id) {
                            self.flush(task_id, entry).await;
                        }
                    }
                }
            }
        }

        // Channel closed: drain whatever is left so shutdown loses nothing.
        for (task_id, entry) in pending.drain() {
            self.flush(task_id, entry).await;
        }
    }

    /// Coalesce per task: keep the first old status and the latest new one,
    /// and push the deadline out to the end of the window.
    fn absorb(&self, pending: &mut HashMap<Uuid, PendingTransition>, t: TaskTransition) {
        let due = Instant::now() + self.window;
        pending
            .entry(t.task_id)
            .and_modify(|p| {
                p.new_status = t.new_status;
                p.changed_by = t.changed_by.or(p.changed_by);
                p.due = due;
            })
            .or_insert(PendingTransition {
                old_status: t.old_status,
                new_status: t.new_status,
                changed_by: t.changed_by,
                due,
            });
    }

    async fn flush(&self, task_id: Uuid, entry: PendingTransition) {
        // A burst that lands back where it started is a net no-op.
        if entry.old_status == entry.new_status {
            debug!(task_id = %task_id, "coalesced transitions cancelled out, nothing to send");
            return;
        }

        if let Err(e) = self.dispatch(task_id, &entry).await {
            error!(task_id = %task_id, error = %e, "transition side effects failed");
        }
    }

    async fn dispatch(&self, task_id: Uuid, entry: &PendingTransition) -> Result<(), sqlx::Error> {
        let pool = &self.db.pool;

        // Re-read at flush time so the card reflects the final persisted state.
        let Some(task) = Task::find_by_id(pool, task_id).await? else {
            debug!(task_id = %task_id, "task deleted before side effects ran");
            return Ok(());
        };
        let Some(project) = Project::find_by_id(pool, task.project_id).await? else {
            debug!(task_id = %task_id, "project deleted before side effects ran");
            return Ok(());
        };
        let channel = Group::find_by_id(pool, project.group_id)
            .await?
            .and_then(|g| g.line_group_id);

        let assignee_name = User::display_name(pool, task.assigned_to).await?;
        let updated_by_name = User::display_name(pool, entry.changed_by).await?;

        self.notifications
            .notify(
                channel.as_deref(),
                Notification::TaskStatusChanged {
                    project_id: project.id,
                    project_name: project.name.clone(),
                    task_name: task.name.clone(),
                    old_status: entry.old_status,
                    new_status: entry.new_status,
                    assignee_name,
                    updated_by_name,
                },
            )
            .await;

        if entry.new_status.is_terminal() {
            if let Err(e) = completion::evaluate(pool, &self.notifications, project.id).await {
                error!(project_id = %project.id, error = %e, "completion evaluation failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use db::models::project::ProjectStatus;

    use super::*;
    use crate::services::test_support::{self, seed_task};

    #[tokio::test]
    async fn burst_of_updates_yields_one_card_with_final_state() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C1")).await;
        let task = seed_task(&db.pool, ids.project_id, TaskStatus::Reviewing).await;

        let (handle, worker) = TransitionQueue::spawn(
            db.clone(),
            notifications,
            Duration::from_millis(20),
        );

        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::Todo,
            new_status: TaskStatus::InProgress,
            changed_by: None,
        });
        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::InProgress,
            new_status: TaskStatus::Reviewing,
            changed_by: None,
        });

        drop(handle);
        worker.await.unwrap();

        let pushes = pusher.pushes();
        assert_eq!(pushes.len(), 1);
        let card = pushes[0].1[0].to_string();
        assert!(card.contains("To do"));
        assert!(card.contains("In review"));
    }

    #[tokio::test]
    async fn net_noop_burst_sends_nothing() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C1")).await;
        let task = seed_task(&db.pool, ids.project_id, TaskStatus::Todo).await;

        let (handle, worker) = TransitionQueue::spawn(
            db.clone(),
            notifications,
            Duration::from_millis(20),
        );

        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::Todo,
            new_status: TaskStatus::InProgress,
            changed_by: None,
        });
        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::InProgress,
            new_status: TaskStatus::Todo,
            changed_by: None,
        });

        drop(handle);
        worker.await.unwrap();

        assert!(pusher.pushes().is_empty());
    }

    #[tokio::test]
    async fn terminal_transition_triggers_completion_check() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C1")).await;
        let task = seed_task(&db.pool, ids.project_id, TaskStatus::Completed).await;

        let (handle, worker) = TransitionQueue::spawn(
            db.clone(),
            notifications,
            Duration::from_millis(20),
        );

        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::InProgress,
            new_status: TaskStatus::Completed,
            changed_by: None,
        });

        drop(handle);
        worker.await.unwrap();

        // Status card plus project-completed card.
        assert_eq!(pusher.pushes().len(), 2);
        let project = Project::find_by_id(&db.pool, ids.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Achieved);
    }

    #[tokio::test]
    async fn deleted_task_is_skipped_quietly() {
        let (db, pusher, notifications) = test_support::harness().await;
        let ids = test_support::seed_project(&db.pool, Some("C1")).await;
        let task = seed_task(&db.pool, ids.project_id, TaskStatus::InProgress).await;
        Task::delete(&db.pool, task.id).await.unwrap();

        let (handle, worker) = TransitionQueue::spawn(
            db.clone(),
            notifications,
            Duration::from_millis(20),
        );

        handle.enqueue(TaskTransition {
            task_id: task.id,
            project_id: ids.project_id,
            old_status: TaskStatus::Todo,
            new_status: TaskStatus::InProgress,
            changed_by: None,
        });

        drop(handle);
        worker.await.unwrap();

        assert!(pusher.pushes().is_empty());
    }
}
