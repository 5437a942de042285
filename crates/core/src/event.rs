//! Turn lifecycle events — decoupled signalling between the orchestration
//! loop and the task queue.
//!
//! The loop publishes what happened during a turn; the queue subscribes to
//! surface RETRY status without the two crates knowing about each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events published while processing a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A turn began executing.
    TurnStarted {
        task_id: Uuid,
        user_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A transient model-call failure is being retried.
    ModelCallRetried {
        task_id: Uuid,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was dispatched.
    ToolExecuted {
        task_id: Uuid,
        tool_name: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The turn finished with an answer.
    TurnCompleted {
        task_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// The turn failed terminally.
    TurnFailed {
        task_id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl TurnEvent {
    /// The task this event belongs to.
    pub fn task_id(&self) -> Uuid {
        match self {
            Self::TurnStarted { task_id, .. }
            | Self::ModelCallRetried { task_id, .. }
            | Self::ToolExecuted { task_id, .. }
            | Self::TurnCompleted { task_id, .. }
            | Self::TurnFailed { task_id, .. } => *task_id,
        }
    }
}

/// A broadcast-based event bus for turn events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub; publishing with
/// no subscribers is fine.
pub struct EventBus {
    sender: broadcast::Sender<Arc<TurnEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TurnEvent) {
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TurnEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_subscribe_roundtrip() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.publish(TurnEvent::ModelCallRetried {
            task_id: id,
            attempt: 2,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.task_id(), id);
        match event.as_ref() {
            TurnEvent::ModelCallRetried { attempt, .. } => assert_eq!(*attempt, 2),
            _ => panic!("Expected ModelCallRetried"),
        }
    }

    #[test]
    fn publish_without_subscribers_doesnt_panic() {
        let bus = EventBus::default();
        bus.publish(TurnEvent::TurnCompleted {
            task_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });
    }
}
