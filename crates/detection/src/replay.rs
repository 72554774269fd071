//! Replay of pre-computed detections
//!
//! File format: JSON Lines, one object per frame:
//! `{"frame": 12, "detections": [{"label": "car", "confidence": 0.8, "bbox": [x1, y1, x2, y2]}]}`.
//! Frames missing from the file have no detections.

use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use frame_source::VideoFrame;
use serde::Deserialize;
use tracing::{info, warn};

use crate::detector::Detector;
use crate::{Detection, DetectionError};

#[derive(Debug, Deserialize)]
struct ReplayLine {
    frame: u64,
    #[serde(default)]
    detections: Vec<Detection>,
}

/// Serves detections recorded per frame sequence number
pub struct ReplayDetector {
    name: String,
    frames: HashMap<u64, Vec<Detection>>,
    labels: BTreeSet<String>,
}

impl ReplayDetector {
    /// Load a replay file
    pub fn open(name: &str, path: &Path) -> Result<Self, DetectionError> {
        let file = std::fs::File::open(path)?;
        let detector = Self::from_reader(name, &path.display().to_string(), file)?;
        info!(
            "Loaded replay detector '{}' from {} ({} frames)",
            name,
            path.display(),
            detector.frames.len()
        );
        Ok(detector)
    }

    /// Parse replay lines from any reader; `origin` is used in error messages
    pub fn from_reader<R: Read>(name: &str, origin: &str, reader: R) -> Result<Self, DetectionError> {
        let mut frames: HashMap<u64, Vec<Detection>> = HashMap::new();
        let mut labels = BTreeSet::new();

        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let parsed: ReplayLine = serde_json::from_str(&line).map_err(|e| DetectionError::Replay {
                path: origin.to_string(),
                line: idx + 1,
                reason: e.to_string(),
            })?;

            let entry = frames.entry(parsed.frame).or_default();
            for det in parsed.detections {
                if !det.bbox.is_well_formed() {
                    warn!(
                        "{}:{}: dropping '{}' with malformed box {:?}",
                        origin,
                        idx + 1,
                        det.label,
                        det.bbox
                    );
                    continue;
                }
                if !(0.0..=1.0).contains(&det.confidence) {
                    warn!(
                        "{}:{}: dropping '{}' with confidence {} outside [0, 1]",
                        origin,
                        idx + 1,
                        det.label,
                        det.confidence
                    );
                    continue;
                }
                labels.insert(det.label.clone());
                entry.push(det);
            }
        }

        Ok(Self {
            name: name.to_string(),
            frames,
            labels,
        })
    }

    /// Number of frames with recorded entries
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        Ok(self.frames.get(&frame.sequence).cloned().unwrap_or_default())
    }
}
