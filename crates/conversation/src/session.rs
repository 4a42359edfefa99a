//! The conversation runtime task and the handle used to drive it.
//!
//! One task owns the controller and the scheduler. Commands, scheduler wakes
//! and shutdown are all handled on that task, so every transition is applied
//! one at a time and a reset can never race with a cycle that is firing.

use signspeak_classify::ClassifierRef;
use signspeak_events::{emit_event, event_names, now_ms, EventBusRef, PermissionEvent};
use signspeak_media::{MediaSource, PermissionState};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::controller::ConversationController;
use crate::error::{ConversationError, Result};
use crate::questions::Questions;
use crate::scheduler::DetectionScheduler;
use crate::state::ConversationSnapshot;

const COMMAND_CAPACITY: usize = 16;

enum Command {
    Start { reply: oneshot::Sender<Result<Uuid>> },
    Reset { reply: oneshot::Sender<()> },
}

pub struct ConversationRuntime {
    controller: ConversationController,
    scheduler: DetectionScheduler,
    events: EventBusRef,
}

impl ConversationRuntime {
    pub fn new(
        questions: Questions,
        media: MediaSource,
        classifier: ClassifierRef,
        config: SchedulerConfig,
        events: EventBusRef,
    ) -> Self {
        Self {
            controller: ConversationController::new(questions, media),
            scheduler: DetectionScheduler::new(config, classifier, events.clone()),
            events,
        }
    }

    /// Spawn the runtime on the current tokio runtime.
    pub fn spawn(self) -> (ConversationHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(self.controller.snapshot());
        let cancel = CancellationToken::new();

        let handle = ConversationHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(self.run(command_rx, snapshot_tx, cancel));
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        snapshots: watch::Sender<ConversationSnapshot>,
        cancel: CancellationToken,
    ) {
        tracing::info!(total = self.controller.questions().len(), "conversation runtime started");
        self.publish(&snapshots);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("conversation runtime cancelled");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!("all conversation handles dropped");
                        break;
                    };
                    self.handle_command(command).await;
                }
                wake = self.scheduler.wait() => {
                    self.scheduler.on_wake(&mut self.controller, wake);
                }
            }
            self.publish(&snapshots);
        }

        self.reset();
        self.publish(&snapshots);
        tracing::info!("conversation runtime stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self.start().await;
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
        }
    }

    async fn start(&mut self) -> Result<Uuid> {
        let had_permissions = self.controller.permissions().is_granted();
        match self.controller.start().await {
            Ok(session) => {
                if !had_permissions {
                    self.emit_permissions(None);
                }
                self.scheduler.arm_cycle(session);
                Ok(session)
            }
            Err(e @ ConversationError::PermissionDenied(_)) => {
                tracing::warn!("conversation not started: {}", e);
                self.emit_permissions(Some(e.to_string()));
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn reset(&mut self) {
        self.scheduler.cancel();
        let had_permissions = self.controller.permissions().is_granted();
        self.controller.reset();
        if had_permissions {
            self.emit_permissions(None);
        }
    }

    fn emit_permissions(&self, error: Option<String>) {
        let permissions = self.controller.permissions();
        emit_event(
            self.events.as_ref(),
            event_names::CONVERSATION_PERMISSION,
            &PermissionEvent {
                camera: permissions.camera,
                microphone: permissions.microphone,
                speaker: permissions.speaker,
                error,
                ts_ms: now_ms(),
            },
        );
    }

    fn publish(&self, snapshots: &watch::Sender<ConversationSnapshot>) {
        let snapshot = self.controller.snapshot();
        let event = snapshot.to_event();
        let changed = snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        if changed {
            emit_event(self.events.as_ref(), event_names::CONVERSATION_STATE, &event);
        }
    }
}

/// Cloneable handle to a running conversation.
#[derive(Clone)]
pub struct ConversationHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ConversationSnapshot>,
    cancel: CancellationToken,
}

impl ConversationHandle {
    /// Acquire capture and show the first question.
    pub async fn start(&self) -> Result<Uuid> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Start { reply })
            .await
            .map_err(|_| ConversationError::Closed)?;
        rx.await.map_err(|_| ConversationError::Closed)?
    }

    /// Cancel any pending detection, release capture and return to Idle.
    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Reset { reply })
            .await
            .map_err(|_| ConversationError::Closed)?;
        rx.await.map_err(|_| ConversationError::Closed)
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn permissions(&self) -> PermissionState {
        self.snapshots.borrow().permissions
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the runtime. Capture is released before the task exits.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use signspeak_events::InMemoryEventBus;

    use super::*;
    use crate::state::ConversationState;
    use crate::test_support::{ScriptedClassifier, StillBackend};

    fn runtime(
        backend: StillBackend,
        classifier: Arc<ScriptedClassifier>,
        events: Arc<InMemoryEventBus>,
    ) -> ConversationRuntime {
        ConversationRuntime::new(
            Questions::new(["Q1", "Q2"]).unwrap(),
            MediaSource::new(Arc::new(backend)),
            classifier,
            SchedulerConfig::default(),
            events,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_publishes_first_question() {
        let events = Arc::new(InMemoryEventBus::new());
        let classifier = ScriptedClassifier::new(&[]);
        let (handle, _task) = runtime(StillBackend::granting(), classifier, events.clone()).spawn();

        let session = handle.start().await.unwrap();
        let snapshot = handle.snapshot();

        assert_eq!(snapshot.session_id, Some(session));
        assert_eq!(snapshot.state, ConversationState::Active);
        assert_eq!(snapshot.question.as_deref(), Some("Q1"));
        assert!(handle.permissions().is_granted());
        assert_eq!(events.count(event_names::CONVERSATION_PERMISSION), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_start_reports_error() {
        let events = Arc::new(InMemoryEventBus::new());
        let classifier = ScriptedClassifier::new(&[]);
        let (handle, _task) = runtime(StillBackend::denying(), classifier, events.clone()).spawn();

        let err = handle.start().await.unwrap_err();

        assert!(matches!(err, ConversationError::PermissionDenied(_)));
        assert_eq!(handle.snapshot().state, ConversationState::Idle);
        let permission = &events.events_for(event_names::CONVERSATION_PERMISSION)[0];
        assert_eq!(permission.payload["camera"], false);
        assert!(permission.payload["error"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_and_closes() {
        let events = Arc::new(InMemoryEventBus::new());
        let classifier = ScriptedClassifier::new(&[]);
        let (handle, task) = runtime(StillBackend::granting(), classifier, events).spawn();
        handle.start().await.unwrap();

        handle.shutdown();
        task.await.unwrap();

        assert_eq!(handle.snapshot().state, ConversationState::Idle);
        assert!(!handle.permissions().is_granted());
        assert!(matches!(
            handle.start().await,
            Err(ConversationError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_events_only_on_change() {
        let events = Arc::new(InMemoryEventBus::new());
        let classifier = ScriptedClassifier::new(&[]);
        let (handle, _task) = runtime(StillBackend::granting(), classifier, events.clone()).spawn();

        handle.reset().await.unwrap();
        handle.reset().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(events.count(event_names::CONVERSATION_STATE), 0);
    }
}
