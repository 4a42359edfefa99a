use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::backend::{CaptureBackend, LiveStream, StreamRequest, TrackKind};
use crate::permissions::PermissionState;
use crate::sink::VideoSink;
use crate::{MediaError, Result};

pub const JPEG_MIME: &str = "image/jpeg";

/// Quality browsers use for `image/jpeg` when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpegConfig {
    /// 1..=100, clamped on use.
    pub quality: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// A still frame encoded for upload.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedFrame {
    pub fn mime(&self) -> &'static str {
        JPEG_MIME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Exclusive owner of the capture stream and its video sink.
pub struct MediaSource {
    backend: Arc<dyn CaptureBackend>,
    sink: VideoSink,
    stream: Option<Arc<dyn LiveStream>>,
    jpeg: JpegConfig,
}

impl MediaSource {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self::with_jpeg_config(backend, JpegConfig::default())
    }

    pub fn with_jpeg_config(backend: Arc<dyn CaptureBackend>, jpeg: JpegConfig) -> Self {
        Self {
            backend,
            sink: VideoSink::new(),
            stream: None,
            jpeg,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.stream.is_some()
    }

    pub fn sink(&self) -> &VideoSink {
        &self.sink
    }

    /// Request combined camera + microphone access and start playback.
    ///
    /// Succeeds only when both tracks are granted. A stream missing either
    /// track is stopped immediately and reported as `PermissionDenied`.
    pub async fn acquire(&mut self) -> Result<PermissionState> {
        if self.stream.is_some() {
            return Ok(PermissionState::granted());
        }

        let stream: Arc<dyn LiveStream> = self
            .backend
            .request_stream(StreamRequest::audio_video())
            .await
            .map(Arc::from)
            .map_err(|e| match e {
                MediaError::PermissionDenied(reason) => MediaError::PermissionDenied(reason),
                other => MediaError::PermissionDenied(other.to_string()),
            })?;

        let tracks = stream.tracks();
        let missing: Vec<TrackKind> = [TrackKind::Video, TrackKind::Audio]
            .into_iter()
            .filter(|kind| !tracks.contains(kind))
            .collect();

        if !missing.is_empty() {
            stream.stop();
            tracing::warn!(?missing, "capture stream granted partially, releasing it");
            return Err(MediaError::PermissionDenied(format!(
                "missing tracks: {missing:?}"
            )));
        }

        self.sink.attach(Arc::clone(&stream));
        self.sink.play();
        self.stream = Some(stream);

        tracing::info!("capture stream acquired");
        Ok(PermissionState::granted())
    }

    /// Encode the sink's current frame as a JPEG still.
    pub fn capture_frame(&self) -> Result<EncodedFrame> {
        if self.stream.is_none() {
            return Err(MediaError::NotAcquired);
        }

        let frame = self
            .sink
            .current_frame()
            .ok_or_else(|| MediaError::CaptureUnavailable("video not ready".to_string()))?;

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(MediaError::CaptureUnavailable(
                "video has no dimensions yet".to_string(),
            ));
        }

        let bytes = encode_jpeg(&frame, self.jpeg.quality)?;
        tracing::debug!(width, height, bytes = bytes.len(), "frame captured");

        Ok(EncodedFrame {
            bytes,
            width,
            height,
        })
    }

    /// Stop every track and detach the sink. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            tracing::info!("capture stream released");
        }
        self.sink.detach();
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSource")
            .field("acquired", &self.stream.is_some())
            .field("sink", &self.sink)
            .field("jpeg", &self.jpeg)
            .finish_non_exhaustive()
    }
}

fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(frame)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(bytes)
}
