//! YOLOv8 ONNX detector running on tract

use std::path::Path;

use frame_source::VideoFrame;
use image::imageops::FilterType;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::config::OnnxConfig;
use crate::detector::Detector;
use crate::yolo::{decode_output, DecodeParams};
use crate::{Detection, DetectionError};

/// ONNX-backed detector
pub struct OnnxDetector {
    name: String,
    model: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    config: OnnxConfig,
}

impl OnnxDetector {
    /// Load and optimise the model for a fixed `[1, 3, size, size]` input
    pub fn load(name: &str, config: &OnnxConfig) -> Result<Self, DetectionError> {
        info!("Loading ONNX model from {}", config.model_path.display());
        let size = config.input_size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(&config.model_path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| DetectionError::ModelLoad(e.to_string()))?;

        let labels = read_labels(&config.labels_path)?;
        info!("Model '{}' ready with {} classes", name, labels.len());

        Ok(Self {
            name: name.to_string(),
            model,
            labels,
            config: config.clone(),
        })
    }

    fn preprocess(&self, frame: &VideoFrame) -> Result<Tensor, DetectionError> {
        let rgb = frame
            .to_rgb_image()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let size = self.config.input_size;
        let resized = image::imageops::resize(&rgb, size, size, FilterType::Triangle);

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, c, y, x)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
        );
        Ok(input.into())
    }
}

impl Detector for OnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        let start = std::time::Instant::now();
        let input = self.preprocess(frame)?;

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let shape = view.shape().to_vec();
        if shape.len() != 3 {
            return Err(DetectionError::Inference(format!(
                "expected rank-3 output, got shape {:?}",
                shape
            )));
        }
        let flat: Vec<f32> = view.iter().copied().collect();

        let params = DecodeParams {
            input_size: self.config.input_size,
            frame_width: frame.width,
            frame_height: frame.height,
            confidence_floor: self.config.confidence_floor,
            iou_threshold: self.config.iou_threshold,
        };
        let detections = decode_output(&flat, shape[2], &self.labels, &params);

        debug!(
            "{}: {} detections in {}ms",
            self.name,
            detections.len(),
            start.elapsed().as_millis()
        );
        Ok(detections)
    }
}

fn read_labels(path: &Path) -> Result<Vec<String>, DetectionError> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
