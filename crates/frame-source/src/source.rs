//! Frame source implementations

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::frame::VideoFrame;
use crate::CaptureError;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A lazy, possibly rewindable sequence of frames.
///
/// `Ok(None)` marks the end of the stream. Errors are per-frame; callers
/// decide whether to rewind or stop (see [`crate::StreamPolicy`]).
pub trait FrameSource {
    /// Acquire the next frame, blocking until one is available
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError>;

    /// Restart the stream from its first frame
    fn rewind(&mut self) -> Result<(), CaptureError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        (**self).next_frame()
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        (**self).rewind()
    }
}

/// Preloaded frames replayed in order
pub struct MemorySource {
    frames: Vec<VideoFrame>,
    cursor: usize,
    /// Errors injected before the frame at the given index is served
    failures: VecDeque<usize>,
}

impl MemorySource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames,
            cursor: 0,
            failures: VecDeque::new(),
        }
    }

    /// Make the source fail once when it reaches `index`
    pub fn fail_at(mut self, index: usize) -> Self {
        self.failures.push_back(index);
        self
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        if self.failures.front() == Some(&self.cursor) {
            self.failures.pop_front();
            return Err(CaptureError::Decode {
                path: format!("memory[{}]", self.cursor),
                reason: "injected failure".to_string(),
            });
        }

        let frame = self.frames.get(self.cursor).cloned().map(|mut f| {
            f.sequence = self.cursor as u64;
            f
        });
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        self.cursor = 0;
        Ok(())
    }
}

/// Image sequence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSequenceConfig {
    /// Directory holding the frames
    pub dir: PathBuf,
    /// Nominal frame rate used to derive frame timestamps
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    30
}

impl ImageSequenceConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fps: default_fps(),
        }
    }
}

/// Directory of still images, visited in lexicographic file-name order
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    frame_interval_ns: u64,
}

impl ImageSequenceSource {
    /// Scan the directory for image files
    pub fn open(config: &ImageSequenceConfig) -> Result<Self, CaptureError> {
        if config.fps == 0 {
            return Err(CaptureError::Open("fps must be positive".to_string()));
        }

        let entries = std::fs::read_dir(&config.dir).map_err(|e| {
            CaptureError::Open(format!("{}: {}", config.dir.display(), e))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();

        info!(
            "Opened image sequence {} ({} frames @ {} fps)",
            config.dir.display(),
            paths.len(),
            config.fps
        );

        Ok(Self {
            paths,
            cursor: 0,
            frame_interval_ns: 1_000_000_000 / config.fps as u64,
        })
    }

    /// Number of frames in one pass
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        let sequence = self.cursor as u64;
        // Advance first so a corrupt file is not retried forever
        self.cursor += 1;

        debug!("Decoding frame {} from {}", sequence, path.display());
        let image = image::open(path).map_err(|e| CaptureError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(VideoFrame::from_rgb_image(
            image.to_rgb8(),
            sequence * self.frame_interval_ns,
            sequence,
        )))
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        self.cursor = 0;
        Ok(())
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
