//! Platform capture traits.
//!
//! These abstract the device layer so that the session logic stays testable
//! and can run against recorded frames.

use async_trait::async_trait;
use image::RgbImage;

/// Kind of a track carried by a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Which tracks a capture request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub video: bool,
    pub audio: bool,
}

impl StreamRequest {
    /// Combined camera + microphone request.
    pub fn audio_video() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    pub fn wants(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Video => self.video,
            TrackKind::Audio => self.audio,
        }
    }
}

/// A live capture stream handed out by a [`CaptureBackend`].
pub trait LiveStream: Send + Sync {
    /// Tracks the platform actually granted.
    fn tracks(&self) -> Vec<TrackKind>;

    /// The frame currently presented by the video track, if any.
    ///
    /// Returns `None` before the first frame arrives and after `stop`.
    fn latest_frame(&self) -> Option<RgbImage>;

    /// Stop every track. Must be idempotent.
    fn stop(&self);
}

/// Platform entry point for device access.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Ask the platform for a stream carrying the requested tracks.
    ///
    /// Returns `MediaError::PermissionDenied` when the user or the platform
    /// rejects access.
    async fn request_stream(&self, request: StreamRequest) -> crate::Result<Box<dyn LiveStream>>;
}
