//! Emergency vehicle override

use detection::Detection;

use crate::config::EmergencyConfig;

/// Decides whether the frame contains a qualifying emergency vehicle.
///
/// Stateless: every frame is judged on its own detections.
#[derive(Debug, Clone)]
pub struct EmergencyDecider {
    label: String,
    confidence_threshold: f32,
    min_area: f32,
    max_aspect_ratio: Option<f32>,
}

impl EmergencyDecider {
    pub fn new(config: &EmergencyConfig) -> Self {
        Self {
            label: config.label.clone(),
            confidence_threshold: config.confidence_threshold,
            min_area: config.min_area,
            max_aspect_ratio: config.max_aspect_ratio,
        }
    }

    /// All active filters pass
    pub fn qualifies(&self, detection: &Detection) -> bool {
        let bbox = &detection.bbox;
        detection.label == self.label
            && detection.confidence > self.confidence_threshold
            && bbox.area() > self.min_area
            && self
                .max_aspect_ratio
                .map_or(true, |max| bbox.aspect_ratio() < max)
    }

    /// Detections that trigger the override
    pub fn qualifying<'a>(&self, detections: &'a [Detection]) -> Vec<&'a Detection> {
        detections.iter().filter(|d| self.qualifies(d)).collect()
    }

    pub fn is_active(&self, detections: &[Detection]) -> bool {
        detections.iter().any(|d| self.qualifies(d))
    }
}
