//! Event bus abstraction for decoupled event emission.
//!
//! The conversation runtime publishes every observable change through an
//! [`EventBus`] so that whatever draws the conversation (terminal, window,
//! test harness) never reaches into the runtime's state directly.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

/// Trait for emitting events to subscribers.
pub trait EventBus: Send + Sync {
    /// Emit an event with a JSON payload.
    ///
    /// # Arguments
    /// * `topic` - Event name/topic (e.g., "conversation:state")
    /// * `payload` - JSON payload to emit
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

/// Type alias for shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize `event` and emit it on `topic`.
///
/// Serialization failures are dropped; event DTOs are plain data and only
/// fail to serialize if a map key is not a string.
pub fn emit_event<E: serde::Serialize>(bus: &dyn EventBus, topic: &str, event: &E) {
    if let Ok(payload) = serde_json::to_value(event) {
        bus.emit(topic, payload);
    }
}

/// A captured event.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// In-memory event bus for testing.
///
/// Captures all emitted events for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<EmittedEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<EmittedEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.guard().clone()
    }

    /// Get events for a specific topic, in emission order.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.guard()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Number of events captured for `topic`.
    pub fn count(&self, topic: &str) -> usize {
        self.guard().iter().filter(|e| e.topic == topic).count()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.guard().push(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Fan-out bus backed by a tokio broadcast channel.
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// conversation runtime.
#[derive(Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<EmittedEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EmittedEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus for BroadcastEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        // No receivers is fine: nobody is drawing the conversation yet.
        let _ = self.tx.send(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// No-op event bus that discards all events.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_event_bus() {
        let bus = InMemoryEventBus::new();

        bus.emit("conversation:state", json!({"state": "idle"}));
        bus.emit("detection:cycle", json!({"index": 0}));
        bus.emit("conversation:state", json!({"state": "active"}));

        assert_eq!(bus.len(), 3);
        assert_eq!(bus.count("conversation:state"), 2);
        assert_eq!(bus.count("detection:cycle"), 1);
        assert_eq!(bus.count("detection:settle"), 0);

        let states = bus.events_for("conversation:state");
        assert_eq!(states[1].payload["state"], "active");
    }

    #[test]
    fn test_in_memory_event_bus_clear() {
        let bus = InMemoryEventBus::new();

        bus.emit("detection:result", json!({}));
        assert!(!bus.is_empty());

        bus.clear();
        assert!(bus.is_empty());
    }

    #[test]
    fn test_emit_event_serializes_payload() {
        #[derive(serde::Serialize)]
        struct Ping {
            index: usize,
        }

        let bus = InMemoryEventBus::new();
        emit_event(&bus, "detection:cycle", &Ping { index: 3 });

        assert_eq!(bus.events()[0].payload, json!({"index": 3}));
    }

    #[tokio::test]
    async fn test_broadcast_event_bus_fans_out() {
        let bus = BroadcastEventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit("conversation:permission", json!({"camera": true}));

        assert_eq!(first.recv().await.unwrap().topic, "conversation:permission");
        assert_eq!(second.recv().await.unwrap().payload["camera"], true);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let bus = BroadcastEventBus::default();
        bus.emit("conversation:state", json!({}));
    }
}
