//! Frame Source Library for the Traffic Dashboard
//!
//! Supplies successive RGB frames to the per-frame pipeline.
//! Supports:
//! - Directories of still images (a decoded video dump or camera snapshots)
//! - Preloaded in-memory frames (tests, dry runs)
//! - Looping or stopping at end of stream

pub mod frame;
pub mod policy;
pub mod source;

pub use frame::VideoFrame;
pub use policy::{EndOfStream, StreamPolicy, StreamStats};
pub use source::{FrameSource, ImageSequenceConfig, ImageSequenceSource, MemorySource};

use thiserror::Error;

/// Frame acquisition error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to decode frame {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Invalid frame buffer: {0}")]
    InvalidFrame(String),

    #[error("Source does not support rewinding")]
    RewindUnsupported,
}
