//! Camera backend that replays still images from a directory.
//!
//! Frames are decoded once when the directory is opened. Each frame read
//! advances to the next image, wrapping around at the end, so a folder of
//! recorded signs behaves like a looping camera feed. The audio track is
//! silent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;

use crate::backend::{CaptureBackend, LiveStream, StreamRequest, TrackKind};
use crate::{MediaError, Result};

const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Clone)]
pub struct DirectoryCamera {
    frames: Arc<[RgbImage]>,
}

impl DirectoryCamera {
    /// Scan `dir` for image files, sorted by file name, and decode them.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| MediaError::Backend(format!("cannot read {}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_frame_file(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(MediaError::Backend(format!(
                "no image frames in {}",
                dir.display()
            )));
        }

        let frames = paths
            .iter()
            .map(|path| decode_frame(path))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(count = frames.len(), dir = %dir.display(), "frame directory opened");
        Ok(Self {
            frames: frames.into(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn decode_frame(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.into_rgb8())
        .map_err(|e| MediaError::Backend(format!("cannot decode {}: {e}", path.display())))
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

#[async_trait]
impl CaptureBackend for DirectoryCamera {
    async fn request_stream(&self, request: StreamRequest) -> Result<Box<dyn LiveStream>> {
        if !request.video {
            return Err(MediaError::Backend(
                "directory camera only serves video streams".to_string(),
            ));
        }

        let mut tracks = vec![TrackKind::Video];
        if request.audio {
            tracks.push(TrackKind::Audio);
        }

        Ok(Box::new(DirectoryStream {
            frames: Arc::clone(&self.frames),
            cursor: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            tracks,
        }))
    }
}

struct DirectoryStream {
    frames: Arc<[RgbImage]>,
    cursor: AtomicUsize,
    stopped: AtomicBool,
    tracks: Vec<TrackKind>,
}

impl LiveStream for DirectoryStream {
    fn tracks(&self) -> Vec<TrackKind> {
        if self.stopped.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.tracks.clone()
    }

    fn latest_frame(&self) -> Option<RgbImage> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }

        let position = self.cursor.fetch_add(1, Ordering::SeqCst) % self.frames.len();
        self.frames.get(position).cloned()
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str, width: u32, height: u32) {
        RgbImage::new(width, height).save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_open_skips_non_images() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "b.png", 3, 3);
        write_frame(dir.path(), "a.png", 2, 2);
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let camera = DirectoryCamera::open(dir.path()).unwrap();
        assert_eq!(camera.frame_count(), 2);
        assert_eq!(camera.frames[0].dimensions(), (2, 2));
    }

    #[test]
    fn test_open_rejects_undecodable_frame() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 2, 2);
        std::fs::write(dir.path().join("b.jpg"), b"not a jpeg").unwrap();

        let err = DirectoryCamera::open(dir.path()).unwrap_err();
        assert!(matches!(err, MediaError::Backend(ref msg) if msg.contains("b.jpg")));
    }

    #[tokio::test]
    async fn test_frames_survive_file_removal() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "01.png", 4, 3);
        let camera = DirectoryCamera::open(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join("01.png")).unwrap();

        let stream = camera
            .request_stream(StreamRequest::audio_video())
            .await
            .unwrap();
        assert_eq!(stream.latest_frame().unwrap().dimensions(), (4, 3));
    }

    #[test]
    fn test_open_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DirectoryCamera::open(dir.path()),
            Err(MediaError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_cycles_frames_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "01.png", 3, 2);
        write_frame(dir.path(), "02.png", 5, 4);

        let camera = DirectoryCamera::open(dir.path()).unwrap();
        let stream = camera
            .request_stream(StreamRequest::audio_video())
            .await
            .unwrap();

        assert_eq!(stream.tracks(), vec![TrackKind::Video, TrackKind::Audio]);
        assert_eq!(stream.latest_frame().unwrap().dimensions(), (3, 2));
        assert_eq!(stream.latest_frame().unwrap().dimensions(), (5, 4));
        assert_eq!(stream.latest_frame().unwrap().dimensions(), (3, 2));

        stream.stop();
        assert!(stream.latest_frame().is_none());
        assert!(stream.tracks().is_empty());
    }
}
