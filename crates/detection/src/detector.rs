//! Detector trait

use frame_source::VideoFrame;

use crate::{Detection, DetectionError};

/// Black-box object detector: one call per frame
pub trait Detector {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Class vocabulary the detector can emit
    fn labels(&self) -> Vec<String>;

    /// Run detection on a frame
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn labels(&self) -> Vec<String> {
        (**self).labels()
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        (**self).detect(frame)
    }
}

/// Detector that never sees anything
#[derive(Debug, Default)]
pub struct NullDetector;

impl Detector for NullDetector {
    fn name(&self) -> &str {
        "null"
    }

    fn labels(&self) -> Vec<String> {
        Vec::new()
    }

    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        Ok(Vec::new())
    }
}
