//! Yes/no sign-language conversation core.
//!
//! A fixed list of questions is walked one at a time. While a question is on
//! screen a detection cycle fires every few seconds: a still is captured from
//! the camera, sent to the sign classifier, and the answer either advances
//! the conversation (YES/NO, after a short settle pause) or retries the same
//! question (anything else, including errors).
//!
//! ```text
//! ConversationHandle ──commands──▶ ConversationRuntime task
//!                                    ├── ConversationController (state, questions, media)
//!                                    └── DetectionScheduler (timer ▶ capture ▶ classify ▶ settle)
//!                  ◀──snapshots───── watch channel + EventBus
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod questions;
pub mod scheduler;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::{SchedulerConfig, DEFAULT_CYCLE_DELAY, DEFAULT_SETTLE_DELAY};
pub use controller::{Advance, ConversationController};
pub use error::{ConversationError, Result};
pub use questions::{Questions, QuestionsError, RESTAURANT_QUESTIONS};
pub use scheduler::{DetectionScheduler, PendingStep, Wake, WakeKind};
pub use session::{ConversationHandle, ConversationRuntime};
pub use state::{Answer, ConversationSnapshot, ConversationState, DetectionResult};
