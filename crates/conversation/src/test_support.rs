//! Scripted capture and classification doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use signspeak_classify::{Classification, Classifier, ClassifyError};
use signspeak_media::{
    CaptureBackend, LiveStream, MediaError, MediaSource, StreamRequest, TrackKind,
};

use crate::controller::ConversationController;
use crate::questions::Questions;

pub struct StillStream {
    blank: bool,
    stopped: AtomicBool,
}

impl LiveStream for StillStream {
    fn tracks(&self) -> Vec<TrackKind> {
        vec![TrackKind::Video, TrackKind::Audio]
    }

    fn latest_frame(&self) -> Option<RgbImage> {
        if self.blank || self.stopped.load(Ordering::SeqCst) {
            None
        } else {
            Some(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])))
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

pub struct StillBackend {
    grant: bool,
    blank: bool,
}

impl StillBackend {
    pub fn granting() -> Self {
        Self {
            grant: true,
            blank: false,
        }
    }

    pub fn denying() -> Self {
        Self {
            grant: false,
            blank: false,
        }
    }

    /// Grants access but never presents a frame.
    pub fn blank() -> Self {
        Self {
            grant: true,
            blank: true,
        }
    }
}

#[async_trait]
impl CaptureBackend for StillBackend {
    async fn request_stream(
        &self,
        _request: StreamRequest,
    ) -> signspeak_media::Result<Box<dyn LiveStream>> {
        if !self.grant {
            return Err(MediaError::PermissionDenied("dismissed".to_string()));
        }
        Ok(Box::new(StillStream {
            blank: self.blank,
            stopped: AtomicBool::new(false),
        }))
    }
}

pub fn controller_with(backend: StillBackend, questions: &[&str]) -> ConversationController {
    ConversationController::new(
        Questions::new(questions.iter().copied()).unwrap(),
        MediaSource::new(Arc::new(backend)),
    )
}

pub fn controller(questions: &[&str]) -> ConversationController {
    controller_with(StillBackend::granting(), questions)
}

pub fn denying_controller(questions: &[&str]) -> ConversationController {
    controller_with(StillBackend::denying(), questions)
}

/// Replies with queued labels; `None` entries fail with a transport error.
#[derive(Default)]
pub struct ScriptedClassifier {
    replies: Mutex<VecDeque<Option<&'static str>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(replies: &[Option<&'static str>]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, jpeg: Vec<u8>) -> signspeak_classify::Result<Classification> {
        assert!(!jpeg.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(label)) => Ok(Classification::from_raw(Some(label.to_string()))),
            Some(None) => Err(ClassifyError::Transport("connection reset".to_string())),
            None => Ok(Classification::from_raw(None)),
        }
    }
}
