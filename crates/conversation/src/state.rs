//! Conversation state and the snapshot handed to presentation.

use serde::{Deserialize, Serialize};
use signspeak_classify::SignLabel;
use signspeak_events::{now_ms, StateChangedEvent};
use signspeak_media::PermissionState;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    #[default]
    Idle,
    Active,
    Detecting,
    Complete,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Detecting => "detecting",
            Self::Complete => "complete",
        }
    }

    /// Active or Detecting: a question is on screen.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Active | Self::Detecting)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionResult {
    Yes,
    No,
    Uncertain,
    Error,
}

impl DetectionResult {
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Yes | Self::No)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Uncertain => "uncertain",
            Self::Error => "error",
        }
    }

    /// Text shown after "You signed:".
    pub fn display(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Uncertain => "UNCERTAIN",
            Self::Error => "Error",
        }
    }

    pub fn as_label(&self) -> Option<SignLabel> {
        match self {
            Self::Yes => Some(SignLabel::Yes),
            Self::No => Some(SignLabel::No),
            Self::Uncertain => Some(SignLabel::Uncertain),
            Self::Error => None,
        }
    }
}

impl From<SignLabel> for DetectionResult {
    fn from(label: SignLabel) -> Self {
        match label {
            SignLabel::Yes => Self::Yes,
            SignLabel::No => Self::No,
            SignLabel::Uncertain => Self::Uncertain,
        }
    }
}

/// A decisive response given to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub index: usize,
    pub question: String,
    pub response: SignLabel,
}

/// Everything presentation needs to draw the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub session_id: Option<Uuid>,
    pub state: ConversationState,
    pub index: usize,
    pub total: usize,
    /// Prompt on screen; `None` unless Active or Detecting.
    pub question: Option<String>,
    pub last_result: Option<DetectionResult>,
    pub is_detecting: bool,
    pub permissions: PermissionState,
    pub answers: Vec<Answer>,
}

impl ConversationSnapshot {
    /// "Question 2 of 25", while a question is on screen.
    pub fn progress_label(&self) -> Option<String> {
        self.state
            .is_running()
            .then(|| format!("Question {} of {}", self.index + 1, self.total))
    }

    /// "You signed: YES", while a result is visible.
    pub fn result_label(&self) -> Option<String> {
        self.last_result
            .map(|r| format!("You signed: {}", r.display()))
    }

    pub fn to_event(&self) -> StateChangedEvent {
        StateChangedEvent {
            session_id: self.session_id,
            state: self.state.as_str().to_string(),
            index: self.index,
            total: self.total,
            question: self.question.clone(),
            is_detecting: self.is_detecting,
            last_result: self.last_result.map(|r| r.display().to_string()),
            ts_ms: now_ms(),
        }
    }
}
