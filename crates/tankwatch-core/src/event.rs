//! Event bus for tankwatch using tokio::broadcast
//!
//! The history store publishes here when levels change; the web layer
//! forwards events to SSE clients.

use tokio::sync::broadcast;

use crate::models::EntityKind;

/// Events emitted by the data layer
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    /// A level reading was recorded
    ReadingRecorded {
        kind: EntityKind,
        id: String,
        level: f64,
    },
    /// A tank or generator was added or replaced
    EntityUpdated { kind: EntityKind, id: String },
    /// Seed data finished loading
    LoadCompleted,
    /// Readings older than the retention window were dropped
    HistoryPruned { removed: usize },
}

impl DataEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            DataEvent::ReadingRecorded { .. } => "reading_recorded",
            DataEvent::EntityUpdated { .. } => "entity_updated",
            DataEvent::LoadCompleted => "load_completed",
            DataEvent::HistoryPruned { .. } => "history_pruned",
        }
    }
}

/// Event bus for broadcasting data events
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DataEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
