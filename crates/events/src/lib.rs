//! Shared event contracts between the conversation core and whatever
//! presents it.
//!
//! Using shared types keeps producers and consumers agreeing on field
//! names. Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{
    emit_event, BroadcastEventBus, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus,
    NullEventBus,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wall-clock timestamp in milliseconds, as carried by every event.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Emitted after every observable change of the conversation.
///
/// Producers: conversation runtime
/// Consumers: presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangedEvent {
    /// Session the change belongs to. `None` while idle.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// One of "idle", "active", "detecting", "complete".
    pub state: String,
    /// Zero-based question index.
    pub index: usize,
    /// Number of questions.
    pub total: usize,
    /// Prompt for the current question (absent when idle or complete).
    #[serde(default)]
    pub question: Option<String>,
    /// Whether a detection cycle is being processed.
    pub is_detecting: bool,
    /// Visible result text ("YES", "NO", "Error").
    #[serde(default)]
    pub last_result: Option<String>,
    pub ts_ms: i64,
}

/// Emitted when a detection cycle fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCycleEvent {
    pub session_id: Uuid,
    pub index: usize,
    /// 1-based attempt number for the current question.
    pub attempt: u32,
    pub ts_ms: i64,
}

/// Emitted when a detection cycle produced an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResultEvent {
    pub session_id: Uuid,
    pub index: usize,
    /// One of "yes", "no", "uncertain", "error".
    pub result: String,
    /// Raw classifier label or error message.
    #[serde(default)]
    pub detail: Option<String>,
    pub ts_ms: i64,
}

/// Emitted when a decisive result starts its settle pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleEvent {
    pub session_id: Uuid,
    pub index: usize,
    pub result: String,
    pub settle_ms: u64,
    pub ts_ms: i64,
}

/// Emitted when the capture permission record changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEvent {
    pub camera: bool,
    pub microphone: bool,
    pub speaker: bool,
    /// Set when an acquisition attempt was rejected.
    #[serde(default)]
    pub error: Option<String>,
    pub ts_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const CONVERSATION_STATE: &str = "conversation:state";
    pub const CONVERSATION_PERMISSION: &str = "conversation:permission";
    pub const DETECTION_CYCLE: &str = "detection:cycle";
    pub const DETECTION_RESULT: &str = "detection:result";
    pub const DETECTION_SETTLE: &str = "detection:settle";
}
