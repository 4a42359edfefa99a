//! Capture device ownership for the signspeak conversation.
//!
//! [`MediaSource`] is the only owner of the live capture stream. It requests
//! combined camera + microphone access from a platform [`CaptureBackend`],
//! binds the stream to a [`VideoSink`], and turns the sink's current frame
//! into a JPEG still on demand.
//!
//! ```text
//! CaptureBackend ──request_stream──▶ LiveStream ──attach──▶ VideoSink
//!                                                              │
//!                               MediaSource::capture_frame ◀───┘ (JPEG)
//! ```

mod backend;
mod directory;
mod permissions;
mod sink;
mod source;

pub use backend::{CaptureBackend, LiveStream, StreamRequest, TrackKind};
pub use directory::DirectoryCamera;
pub use permissions::PermissionState;
pub use sink::VideoSink;
pub use source::{EncodedFrame, JpegConfig, MediaSource, DEFAULT_JPEG_QUALITY, JPEG_MIME};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),
    #[error("capture device not acquired")]
    NotAcquired,
    #[error("no video frame available: {0}")]
    CaptureUnavailable(String),
    #[error("frame encoding failed: {0}")]
    Encode(String),
    #[error("capture backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;
