//! Detector backend configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detector::{Detector, NullDetector};
use crate::replay::ReplayDetector;
use crate::DetectionError;

/// Which backend serves a detector pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetectorConfig {
    /// No detections
    #[default]
    Null,

    /// Pre-computed detections from a JSON Lines file
    Replay { path: PathBuf },

    /// YOLOv8 ONNX export (requires the `onnx` feature)
    Onnx(OnnxConfig),
}

/// ONNX detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxConfig {
    /// Model file
    pub model_path: PathBuf,

    /// Newline-separated class names, in model output order
    pub labels_path: PathBuf,

    /// Square input side the model was exported with
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Pre-NMS score floor; keep it below the dashboard thresholds
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,

    /// NMS overlap threshold
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
}

fn default_input_size() -> u32 {
    640
}

fn default_confidence_floor() -> f32 {
    0.1
}

fn default_iou_threshold() -> f32 {
    0.45
}

/// Instantiate the configured backend
pub fn build_detector(name: &str, config: &DetectorConfig) -> Result<Box<dyn Detector>, DetectionError> {
    info!("Building detector '{}': {:?}", name, config);
    match config {
        DetectorConfig::Null => Ok(Box::new(NullDetector)),
        DetectorConfig::Replay { path } => Ok(Box::new(ReplayDetector::open(name, path)?)),
        #[cfg(feature = "onnx")]
        DetectorConfig::Onnx(onnx) => Ok(Box::new(crate::onnx::OnnxDetector::load(name, onnx)?)),
        #[cfg(not(feature = "onnx"))]
        DetectorConfig::Onnx(_) => Err(DetectionError::BackendUnavailable("onnx")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_config_forms() {
        let replay: DetectorConfig =
            serde_json::from_str(r#"{"kind": "replay", "path": "vehicles.jsonl"}"#).unwrap();
        assert_eq!(
            replay,
            DetectorConfig::Replay {
                path: PathBuf::from("vehicles.jsonl")
            }
        );

        let onnx: DetectorConfig = serde_json::from_str(
            r#"{"kind": "onnx", "model_path": "yolov8m.onnx", "labels_path": "coco.names"}"#,
        )
        .unwrap();
        match onnx {
            DetectorConfig::Onnx(cfg) => {
                assert_eq!(cfg.input_size, 640);
                assert_eq!(cfg.iou_threshold, 0.45);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_build_null_detector() {
        let det = build_detector("ambulance", &DetectorConfig::Null).unwrap();
        assert_eq!(det.name(), "null");
    }

    #[test]
    fn test_build_replay_missing_file() {
        let cfg = DetectorConfig::Replay {
            path: PathBuf::from("/nonexistent/replay.jsonl"),
        };
        assert!(matches!(build_detector("vehicles", &cfg), Err(DetectionError::Io(_))));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_unavailable_without_feature() {
        let cfg = DetectorConfig::Onnx(OnnxConfig {
            model_path: PathBuf::from("m.onnx"),
            labels_path: PathBuf::from("m.names"),
            input_size: 640,
            confidence_floor: 0.1,
            iou_threshold: 0.45,
        });
        assert!(matches!(
            build_detector("vehicles", &cfg),
            Err(DetectionError::BackendUnavailable("onnx"))
        ));
    }
}
