//! Object Detection Contract
//!
//! The dashboard treats the detector as a black box:
//! `frame -> [(label, confidence, box)]`. This crate defines that contract
//! and the backends that satisfy it:
//! - Replay of pre-computed detections (JSON Lines)
//! - YOLOv8-style ONNX models through tract (feature `onnx`)
//! - A null detector for disabled passes

pub mod config;
pub mod detector;
pub mod replay;
pub mod types;
pub mod yolo;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use config::{build_detector, DetectorConfig, OnnxConfig};
pub use detector::{Detector, NullDetector};
pub use replay::ReplayDetector;
pub use types::{BoundingBox, Detection};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid bounding box {0:?}: expected x1 < x2 and y1 < y2")]
    InvalidBox([f32; 4]),

    #[error("Replay file {path} line {line}: {reason}")]
    Replay {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Detector backend '{0}' is not compiled in")]
    BackendUnavailable(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
