use std::sync::Arc;

use image::RgbImage;

use crate::backend::LiveStream;

/// Output sink a live stream is bound to while the session runs.
///
/// Frames are only visible once the sink is attached and playing.
#[derive(Default)]
pub struct VideoSink {
    source: Option<Arc<dyn LiveStream>>,
    playing: bool,
}

impl VideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, stream: Arc<dyn LiveStream>) {
        self.source = Some(stream);
        self.playing = false;
    }

    /// Start presenting frames. No-op without an attached stream.
    pub fn play(&mut self) -> bool {
        self.playing = self.source.is_some();
        self.playing
    }

    pub fn detach(&mut self) {
        self.source = None;
        self.playing = false;
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The frame currently on screen, at the stream's native resolution.
    pub fn current_frame(&self) -> Option<RgbImage> {
        if !self.playing {
            return None;
        }
        self.source.as_ref().and_then(|s| s.latest_frame())
    }
}

impl std::fmt::Debug for VideoSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSink")
            .field("attached", &self.source.is_some())
            .field("playing", &self.playing)
            .finish()
    }
}
