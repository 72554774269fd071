//! Detection and bounding-box types

use serde::{Deserialize, Serialize};

use crate::DetectionError;

/// Axis-aligned box in pixel coordinates, serialized as `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BoundingBox {
    /// Checked constructor: requires `x1 < x2` and `y1 < y2`
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, DetectionError> {
        let bbox = Self { x1, y1, x2, y2 };
        if bbox.is_well_formed() {
            Ok(bbox)
        } else {
            Err(DetectionError::InvalidBox([x1, y1, x2, y2]))
        }
    }

    /// Finite coordinates with strictly positive width and height
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width() / self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Point strictly inside the box; points on any edge are outside
    pub fn contains_strict(&self, (x, y): (f32, f32)) -> bool {
        self.x1 < x && x < self.x2 && self.y1 < y && y < self.y2
    }

    /// Intersection over union
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Clip to `[0, width] x [0, height]`
    pub fn clamp_to(&self, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }
}

/// A single detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label from the model vocabulary (case-sensitive)
    pub label: String,

    /// Detection confidence in [0, 1]
    pub confidence: f32,

    /// Box in frame pixels
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Greedy per-class non-maximum suppression, highest confidence first
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|k| {
            k.label == candidate.label && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checked_constructor() {
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 10.0).is_ok());
        assert!(matches!(
            BoundingBox::new(10.0, 0.0, 5.0, 10.0),
            Err(DetectionError::InvalidBox(_))
        ));
        assert!(BoundingBox::new(0.0, 5.0, 10.0, 5.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, f32::NAN, 5.0).is_err());
    }

    #[test]
    fn test_geometry() {
        let b = BoundingBox::new(200.0, 200.0, 300.0, 250.0).unwrap();
        assert_eq!(b.center(), (250.0, 225.0));
        assert_eq!(b.area(), 5000.0);
        assert_eq!(b.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_contains_strict_excludes_edges() {
        let zone = BoundingBox::new(100.0, 100.0, 500.0, 500.0).unwrap();
        assert!(zone.contains_strict((250.0, 250.0)));
        assert!(!zone.contains_strict((100.0, 250.0)));
        assert!(!zone.contains_strict((500.0, 250.0)));
        assert!(!zone.contains_strict((250.0, 100.0)));
        assert!(!zone.contains_strict((250.0, 500.0)));
    }

    #[test]
    fn test_serde_array_form() {
        let b: BoundingBox = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(b, BoundingBox { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0 });
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1.0,2.0,3.0,4.0]");
    }

    #[test]
    fn test_nms_keeps_best_per_class() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0).unwrap();
        let b = BoundingBox::new(5.0, 5.0, 105.0, 105.0).unwrap();
        let kept = non_max_suppression(
            vec![
                Detection::new("car", 0.6, b),
                Detection::new("car", 0.9, a),
                Detection::new("bus", 0.5, b),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].label, "bus");
    }

    proptest! {
        #[test]
        fn prop_iou_bounded_and_symmetric(
            x in 0.0f32..500.0, y in 0.0f32..500.0, w in 1.0f32..200.0, h in 1.0f32..200.0,
            dx in -100.0f32..100.0, dy in -100.0f32..100.0,
        ) {
            let a = BoundingBox::new(x, y, x + w, y + h).unwrap();
            let b = BoundingBox::new(x + dx, y + dy, x + dx + w, y + dy + h).unwrap();
            let iou = a.iou(&b);
            prop_assert!((0.0..=1.0 + 1e-5).contains(&iou));
            prop_assert!((iou - b.iou(&a)).abs() < 1e-5);
        }
    }
}
