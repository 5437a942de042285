//! Background task queue for chat turns.
//!
//! Each submitted message becomes one tokio task identified by a UUID. The
//! queue keeps a bounded in-memory map of status snapshots and listens on
//! the event bus so transient model-call retries surface as RETRY, matching
//! the status strings pollers already understand
//! (PENDING/STARTED/RETRY/SUCCESS/FAILURE).
//!
//! No cancellation and no cross-task ordering: once spawned, a turn runs to
//! completion or exhausts its retry budget.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use aigentd_core::{EventBus, TurnEvent};
use aigentd_engine::{TurnOutcome, TurnRunner};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Completed snapshots kept before the oldest tasks are evicted.
const SNAPSHOT_CAP: usize = 1024;

/// Lifecycle states of a background turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Started,
    Retry,
    Success,
    Failure,
}

impl TaskState {
    /// SUCCESS and FAILURE are final; everything else may still change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Point-in-time view of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: Uuid,
    pub state: TaskState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TurnOutcome>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Default)]
struct Board {
    snapshots: HashMap<Uuid, TaskSnapshot>,
    order: VecDeque<Uuid>,
}

impl Board {
    fn upsert(&mut self, snapshot: TaskSnapshot) {
        let id = snapshot.task_id;
        if self.snapshots.insert(id, snapshot).is_none() {
            self.order.push_back(id);
            while self.order.len() > SNAPSHOT_CAP {
                if let Some(evicted) = self.order.pop_front() {
                    self.snapshots.remove(&evicted);
                }
            }
        }
    }

    fn set_state(&mut self, id: Uuid, state: TaskState) {
        if let Some(snapshot) = self.snapshots.get_mut(&id) {
            if !snapshot.state.is_terminal() {
                snapshot.state = state;
            }
        }
    }
}

/// Submits turns as tokio tasks and tracks their status.
pub struct TaskQueue {
    runner: Arc<TurnRunner>,
    board: Arc<RwLock<Board>>,
}

impl TaskQueue {
    /// Create a queue around a turn runner. The queue subscribes to `events`
    /// (the same bus the runner publishes on) to surface RETRY.
    pub fn new(runner: Arc<TurnRunner>, events: &EventBus) -> Self {
        let board = Arc::new(RwLock::new(Board::default()));
        Self::spawn_retry_listener(events, Arc::clone(&board));
        Self { runner, board }
    }

    fn spawn_retry_listener(events: &EventBus, board: Arc<RwLock<Board>>) {
        let mut rx = events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let TurnEvent::ModelCallRetried { task_id, attempt, .. } = event.as_ref()
                        {
                            debug!(task_id = %task_id, attempt, "Marking task as retrying");
                            board.write().await.set_state(*task_id, TaskState::Retry);
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Retry listener lagged behind the event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Submit a turn for background execution and return its task id.
    pub async fn submit(&self, user_id: i64, message: String) -> Uuid {
        let task_id = Uuid::new_v4();
        self.board.write().await.upsert(TaskSnapshot {
            task_id,
            state: TaskState::Pending,
            result: None,
            error_message: None,
        });

        let runner = Arc::clone(&self.runner);
        let board = Arc::clone(&self.board);
        tokio::spawn(async move {
            board.write().await.set_state(task_id, TaskState::Started);

            match runner.run(task_id, user_id, &message).await {
                Ok(outcome) => {
                    info!(task_id = %task_id, "Turn succeeded");
                    board.write().await.upsert(TaskSnapshot {
                        task_id,
                        state: TaskState::Success,
                        result: Some(outcome),
                        error_message: None,
                    });
                }
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "Turn failed");
                    board.write().await.upsert(TaskSnapshot {
                        task_id,
                        state: TaskState::Failure,
                        result: None,
                        error_message: Some(e.to_string()),
                    });
                }
            }
        });

        task_id
    }

    /// Current snapshot for a task, if still tracked.
    pub async fn status(&self, task_id: Uuid) -> Option<TaskSnapshot> {
        self.board.read().await.snapshots.get(&task_id).cloned()
    }
}
