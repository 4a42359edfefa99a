//! Question sequencing and the conversation state machine.
//!
//! ```text
//! Idle ──start──▶ Active ──cycle fires──▶ Detecting ──decisive──▶ Active (next question)
//!                   ▲                        │  │
//!                   └──inconclusive / error──┘  └──decisive, last question──▶ Complete
//!
//! any state ──reset──▶ Idle
//! ```
//!
//! The controller owns the capture session: it acquires the media source on
//! `start` and releases it on `reset`.

use signspeak_media::{EncodedFrame, MediaError, MediaSource, PermissionState};
use uuid::Uuid;

use crate::error::{ConversationError, Result};
use crate::questions::Questions;
use crate::state::{Answer, ConversationSnapshot, ConversationState, DetectionResult};

/// Where a decisive result moved the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now showing the question at this index.
    Next(usize),
    Complete,
}

pub struct ConversationController {
    questions: Questions,
    media: MediaSource,
    permissions: PermissionState,
    state: ConversationState,
    index: usize,
    last_result: Option<DetectionResult>,
    is_detecting: bool,
    answers: Vec<Answer>,
    session_id: Option<Uuid>,
}

impl ConversationController {
    pub fn new(questions: Questions, media: MediaSource) -> Self {
        Self {
            questions,
            media,
            permissions: PermissionState::denied(),
            state: ConversationState::Idle,
            index: 0,
            last_result: None,
            is_detecting: false,
            answers: Vec::new(),
            session_id: None,
        }
    }

    /// Acquire capture if needed and show the first question.
    ///
    /// Only valid from Idle. Returns the id of the new session.
    pub async fn start(&mut self) -> Result<Uuid> {
        if self.state != ConversationState::Idle {
            return Err(ConversationError::AlreadyStarted { state: self.state });
        }

        if !self.permissions.is_granted() {
            match self.media.acquire().await {
                Ok(permissions) => self.permissions = permissions,
                Err(e) => {
                    self.permissions = PermissionState::denied();
                    self.media.release();
                    tracing::warn!("capture access rejected: {}", e);
                    let reason = match e {
                        MediaError::PermissionDenied(reason) => reason,
                        other => other.to_string(),
                    };
                    return Err(ConversationError::PermissionDenied(reason));
                }
            }
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.state = ConversationState::Active;
        self.index = 0;
        self.last_result = None;
        self.is_detecting = false;
        self.answers.clear();

        tracing::info!(%session_id, total = self.questions.len(), "conversation started");
        Ok(session_id)
    }

    /// Active -> Detecting when a cycle fires. Returns the question index.
    pub fn begin_detection(&mut self) -> Result<usize> {
        self.expect_state(ConversationState::Active, "begin detection")?;
        self.state = ConversationState::Detecting;
        self.is_detecting = true;
        self.last_result = None;
        Ok(self.index)
    }

    /// Grab a still from the capture session.
    pub fn capture_frame(&self) -> std::result::Result<EncodedFrame, MediaError> {
        self.media.capture_frame()
    }

    /// Show a decisive result while it settles. Stays in Detecting.
    pub fn show_decisive(&mut self, result: DetectionResult) -> Result<()> {
        self.expect_state(ConversationState::Detecting, "show a result")?;
        if !result.is_decisive() {
            return Err(ConversationError::InvalidTransition {
                action: "settle on a non-decisive result",
                state: self.state,
            });
        }
        self.last_result = Some(result);
        Ok(())
    }

    /// Detecting -> Active on the same question with nothing shown.
    pub fn record_inconclusive(&mut self) -> Result<()> {
        self.expect_state(ConversationState::Detecting, "record an inconclusive result")?;
        self.state = ConversationState::Active;
        self.is_detecting = false;
        self.last_result = None;
        Ok(())
    }

    /// Detecting -> Active on the same question, showing the error.
    pub fn record_error(&mut self) -> Result<()> {
        self.expect_state(ConversationState::Detecting, "record an error")?;
        self.state = ConversationState::Active;
        self.is_detecting = false;
        self.last_result = Some(DetectionResult::Error);
        Ok(())
    }

    /// Commit the settled decisive result and move on.
    pub fn advance(&mut self) -> Result<Advance> {
        self.expect_state(ConversationState::Detecting, "advance")?;
        let response = self
            .last_result
            .filter(DetectionResult::is_decisive)
            .and_then(|r| r.as_label())
            .ok_or(ConversationError::InvalidTransition {
                action: "advance without a decisive result",
                state: self.state,
            })?;

        let question = self.questions.get(self.index).unwrap_or_default().to_string();
        self.answers.push(Answer {
            index: self.index,
            question,
            response,
        });
        self.last_result = None;
        self.is_detecting = false;

        if self.questions.is_last(self.index) {
            self.state = ConversationState::Complete;
            tracing::info!(answers = self.answers.len(), "conversation complete");
            return Ok(Advance::Complete);
        }

        self.index += 1;
        self.state = ConversationState::Active;
        tracing::debug!(index = self.index, "advanced to next question");
        Ok(Advance::Next(self.index))
    }

    /// Release capture and return to Idle. Valid from any state.
    pub fn reset(&mut self) {
        self.media.release();
        self.permissions = PermissionState::denied();
        self.state = ConversationState::Idle;
        self.index = 0;
        self.last_result = None;
        self.is_detecting = false;
        self.answers.clear();
        if let Some(session_id) = self.session_id.take() {
            tracing::info!(%session_id, "conversation reset");
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_result(&self) -> Option<DetectionResult> {
        self.last_result
    }

    pub fn is_detecting(&self) -> bool {
        self.is_detecting
    }

    pub fn permissions(&self) -> PermissionState {
        self.permissions
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn questions(&self) -> &Questions {
        &self.questions
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let question = self
            .state
            .is_running()
            .then(|| self.questions.get(self.index).map(str::to_string))
            .flatten();

        ConversationSnapshot {
            session_id: self.session_id,
            state: self.state,
            index: self.index,
            total: self.questions.len(),
            question,
            last_result: self.last_result,
            is_detecting: self.is_detecting,
            permissions: self.permissions,
            answers: self.answers.clone(),
        }
    }

    fn expect_state(&self, expected: ConversationState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConversationError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("total", &self.questions.len())
            .field("last_result", &self.last_result)
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}
