//! Engine events for the external notifier
//!
//! The core emits events over an in-process broadcast channel; delivery to
//! users (chat, email, push) is the consuming notifier's concern, including
//! delivery idempotency.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Events emitted by the assignment engine and lifecycle service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineEvent {
    TicketAssigned { ticket_id: Uuid, agent_id: Uuid },
    DeadlineApproaching { ticket_id: Uuid, agent_id: Uuid },
    TicketCompleted { ticket_id: Uuid, points: i64 },
}

/// Broadcast bus carrying engine events to subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: EngineEvent) {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for engine event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
