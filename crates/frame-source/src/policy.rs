//! End-of-stream handling

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::frame::VideoFrame;
use crate::source::FrameSource;

/// What to do when the source runs dry or fails to deliver a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfStream {
    /// Restart from the first frame
    #[default]
    Loop,
    /// End the stream
    Stop,
}

/// Counters kept by [`StreamPolicy`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames_delivered: u64,
    pub acquisition_errors: u64,
    pub rewinds: u64,
}

/// Applies an [`EndOfStream`] policy on top of a [`FrameSource`].
///
/// A failed acquisition is treated as "no frame this tick": it never
/// propagates, it only triggers a rewind or the end of the stream.
pub struct StreamPolicy<S> {
    source: S,
    end_of_stream: EndOfStream,
    frames_since_rewind: u64,
    finished: bool,
    stats: StreamStats,
}

impl<S: FrameSource> StreamPolicy<S> {
    pub fn new(source: S, end_of_stream: EndOfStream) -> Self {
        Self {
            source,
            end_of_stream,
            frames_since_rewind: 0,
            finished: false,
            stats: StreamStats::default(),
        }
    }

    /// Next frame, or `None` once the stream has ended for good
    pub fn next_frame(&mut self) -> Option<VideoFrame> {
        if self.finished {
            return None;
        }

        if let Some(frame) = self.acquire() {
            return Some(frame);
        }

        match self.end_of_stream {
            EndOfStream::Stop => {
                info!("End of stream after {} frames", self.stats.frames_delivered);
                self.finished = true;
                None
            }
            EndOfStream::Loop => {
                if self.frames_since_rewind == 0 {
                    warn!("Stream produced no frames since last rewind; stopping");
                    self.finished = true;
                    return None;
                }
                if let Err(e) = self.source.rewind() {
                    warn!("Rewind failed: {}", e);
                    self.finished = true;
                    return None;
                }

                self.stats.rewinds += 1;
                self.frames_since_rewind = 0;
                debug!("Rewound stream (rewind #{})", self.stats.rewinds);

                let frame = self.acquire();
                if frame.is_none() {
                    self.finished = true;
                }
                frame
            }
        }
    }

    fn acquire(&mut self) -> Option<VideoFrame> {
        match self.source.next_frame() {
            Ok(Some(frame)) => {
                self.frames_since_rewind += 1;
                self.stats.frames_delivered += 1;
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                self.stats.acquisition_errors += 1;
                warn!("Frame acquisition failed: {}", e);
                None
            }
        }
    }

    /// Whether the stream has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }
}
