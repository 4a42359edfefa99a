//! Timed detection cycles.
//!
//! The scheduler holds at most one pending step at a time: an armed cycle
//! timer, an in-flight classification, or a settle pause. Each step is a
//! boxed future tagged with the session that created it. Dropping the step
//! cancels it, and a wake whose session no longer matches the controller is
//! discarded, so nothing scheduled before a reset can touch the state that
//! follows it.

use std::sync::Arc;

use futures::future::BoxFuture;
use signspeak_classify::{Classification, ClassifierRef};
use signspeak_events::{
    emit_event, event_names, now_ms, DetectionCycleEvent, DetectionResultEvent, EventBusRef,
    SettleEvent,
};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::controller::{Advance, ConversationController};
use crate::state::{ConversationState, DetectionResult};

/// What the scheduler is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStep {
    /// Cycle timer running.
    Armed,
    /// Cycle outcome pending: a classification request in flight, or a
    /// capture failure queued for the next wake.
    Classifying,
    /// Decisive result on screen before advancing.
    Settling,
}

/// A completed pending step.
#[derive(Debug)]
pub struct Wake {
    pub session: Uuid,
    pub kind: WakeKind,
}

#[derive(Debug)]
pub enum WakeKind {
    CycleDue,
    /// The frame could not be captured; carries the reason.
    CaptureFailed(String),
    Classified(signspeak_classify::Result<Classification>),
    Settled,
}

struct Pending {
    session: Uuid,
    step: PendingStep,
    fut: BoxFuture<'static, WakeKind>,
}

pub struct DetectionScheduler {
    config: SchedulerConfig,
    classifier: ClassifierRef,
    events: EventBusRef,
    pending: Option<Pending>,
    attempt: u32,
}

impl DetectionScheduler {
    pub fn new(config: SchedulerConfig, classifier: ClassifierRef, events: EventBusRef) -> Self {
        Self {
            config,
            classifier,
            events,
            pending: None,
            attempt: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn pending_step(&self) -> Option<PendingStep> {
        self.pending.as_ref().map(|p| p.step)
    }

    /// Start the cycle timer for `session`, replacing an armed one.
    ///
    /// Refused while a classification or settle pause is pending.
    pub fn arm_cycle(&mut self, session: Uuid) -> bool {
        if let Some(step @ (PendingStep::Classifying | PendingStep::Settling)) = self.pending_step()
        {
            tracing::debug!(?step, "cycle not armed: detection in progress");
            return false;
        }

        let delay = self.config.cycle_delay();
        self.pending = Some(Pending {
            session,
            step: PendingStep::Armed,
            fut: Box::pin(async move {
                tokio::time::sleep(delay).await;
                WakeKind::CycleDue
            }),
        });
        tracing::trace!(delay_ms = delay.as_millis() as u64, "detection cycle armed");
        true
    }

    /// Drop whatever is pending. The dropped future never completes.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(step = ?pending.step, "pending detection step cancelled");
        }
        self.attempt = 0;
    }

    /// Wait for the pending step to complete.
    ///
    /// Never resolves when nothing is pending. Cancel-safe: if the returned
    /// future is dropped early the step stays pending.
    pub async fn wait(&mut self) -> Wake {
        let Some(pending) = self.pending.as_mut() else {
            return std::future::pending().await;
        };
        let kind = (&mut pending.fut).await;
        let session = pending.session;
        self.pending = None;
        Wake { session, kind }
    }

    /// Apply a completed step to the controller.
    ///
    /// Returns false when the wake belonged to an earlier session.
    pub fn on_wake(&mut self, controller: &mut ConversationController, wake: Wake) -> bool {
        if controller.session_id() != Some(wake.session) {
            tracing::debug!(session = %wake.session, "discarding stale detection wake");
            return false;
        }

        match wake.kind {
            WakeKind::CycleDue => self.run_detection(controller),
            WakeKind::CaptureFailed(detail) => self.fail(controller, wake.session, detail),
            WakeKind::Classified(result) => self.on_classified(controller, wake.session, result),
            WakeKind::Settled => self.on_settled(controller, wake.session),
        }
        true
    }

    /// Capture a frame and submit it for classification.
    ///
    /// Does nothing unless the conversation is Active, so a second cycle can
    /// never start while one is being processed. A capture failure is queued
    /// as an immediately ready step, so Detecting is observable before the
    /// error is recorded.
    pub fn run_detection(&mut self, controller: &mut ConversationController) {
        let Some(session) = controller.session_id() else {
            return;
        };
        if controller.state() != ConversationState::Active {
            tracing::debug!(state = %controller.state(), "skipping detection cycle");
            return;
        }
        let index = match controller.begin_detection() {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!("skipping detection cycle: {}", e);
                return;
            }
        };

        self.attempt += 1;
        emit_event(
            self.events.as_ref(),
            event_names::DETECTION_CYCLE,
            &DetectionCycleEvent {
                session_id: session,
                index,
                attempt: self.attempt,
                ts_ms: now_ms(),
            },
        );

        let frame = match controller.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(index, "frame capture failed: {}", e);
                let detail = e.to_string();
                self.pending = Some(Pending {
                    session,
                    step: PendingStep::Classifying,
                    fut: Box::pin(futures::future::ready(WakeKind::CaptureFailed(detail))),
                });
                return;
            }
        };

        tracing::debug!(index, attempt = self.attempt, bytes = frame.len(), "classifying frame");
        let classifier = Arc::clone(&self.classifier);
        let bytes = frame.bytes;
        self.pending = Some(Pending {
            session,
            step: PendingStep::Classifying,
            fut: Box::pin(async move { WakeKind::Classified(classifier.classify(bytes).await) }),
        });
    }

    fn on_classified(
        &mut self,
        controller: &mut ConversationController,
        session: Uuid,
        result: signspeak_classify::Result<Classification>,
    ) {
        let classification = match result {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!(index = controller.index(), "classification failed: {}", e);
                self.fail(controller, session, e.to_string());
                return;
            }
        };

        let index = controller.index();
        let detection = DetectionResult::from(classification.label);
        self.emit_result(session, index, detection, classification.raw);

        if !detection.is_decisive() {
            tracing::debug!(index, "inconclusive result, retrying");
            if let Err(e) = controller.record_inconclusive() {
                tracing::debug!("inconclusive result dropped: {}", e);
                return;
            }
            self.arm_cycle(session);
            return;
        }

        if let Err(e) = controller.show_decisive(detection) {
            tracing::debug!("decisive result dropped: {}", e);
            return;
        }

        tracing::info!(index, result = detection.as_str(), "sign detected");
        let settle = self.config.settle_delay();
        emit_event(
            self.events.as_ref(),
            event_names::DETECTION_SETTLE,
            &SettleEvent {
                session_id: session,
                index,
                result: detection.as_str().to_string(),
                settle_ms: settle.as_millis() as u64,
                ts_ms: now_ms(),
            },
        );
        self.pending = Some(Pending {
            session,
            step: PendingStep::Settling,
            fut: Box::pin(async move {
                tokio::time::sleep(settle).await;
                WakeKind::Settled
            }),
        });
    }

    fn on_settled(&mut self, controller: &mut ConversationController, session: Uuid) {
        match controller.advance() {
            Ok(Advance::Next(_)) => {
                self.attempt = 0;
                self.arm_cycle(session);
            }
            Ok(Advance::Complete) => self.attempt = 0,
            Err(e) => tracing::warn!("settle did not advance: {}", e),
        }
    }

    fn fail(&mut self, controller: &mut ConversationController, session: Uuid, detail: String) {
        let index = controller.index();
        if let Err(e) = controller.record_error() {
            tracing::debug!("error result dropped: {}", e);
            return;
        }
        self.emit_result(session, index, DetectionResult::Error, Some(detail));
        self.arm_cycle(session);
    }

    fn emit_result(
        &self,
        session: Uuid,
        index: usize,
        result: DetectionResult,
        detail: Option<String>,
    ) {
        emit_event(
            self.events.as_ref(),
            event_names::DETECTION_RESULT,
            &DetectionResultEvent {
                session_id: session,
                index,
                result: result.as_str().to_string(),
                detail,
                ts_ms: now_ms(),
            },
        );
    }
}

impl std::fmt::Debug for DetectionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionScheduler")
            .field("config", &self.config)
            .field("pending", &self.pending_step())
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}
