use serde::{Serialize, Serializer};

use crate::state::ConversationState;

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conversation already started (state: {state})")]
    AlreadyStarted { state: ConversationState },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: ConversationState,
    },

    #[error("Conversation runtime has stopped")]
    Closed,
}

impl Serialize for ConversationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConversationError>;
