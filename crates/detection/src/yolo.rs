//! YOLOv8 output decoding
//!
//! The exported head is `[1, 4 + classes, anchors]`: rows 0..4 hold
//! `cx, cy, w, h` in model-input pixels, the remaining rows hold per-class
//! scores (already sigmoid-activated).

use tracing::debug;

use crate::types::{non_max_suppression, BoundingBox, Detection};

/// Post-processing parameters
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    /// Square model input side
    pub input_size: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Candidates below this score are dropped before NMS
    pub confidence_floor: f32,
    pub iou_threshold: f32,
}

/// Decode a flat row-major `[1, 4 + classes, anchors]` tensor
pub fn decode_output(
    output: &[f32],
    num_anchors: usize,
    labels: &[String],
    params: &DecodeParams,
) -> Vec<Detection> {
    if num_anchors == 0 || output.len() % num_anchors != 0 || output.len() / num_anchors < 5 {
        debug!("Unexpected YOLO output of {} values for {} anchors", output.len(), num_anchors);
        return Vec::new();
    }
    let num_classes = output.len() / num_anchors - 4;
    let at = |row: usize, anchor: usize| output[row * num_anchors + anchor];

    let sx = params.frame_width as f32 / params.input_size as f32;
    let sy = params.frame_height as f32 / params.input_size as f32;

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let (class, score) = (0..num_classes)
            .map(|c| (c, at(4 + c, anchor)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < params.confidence_floor {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        let bbox = BoundingBox {
            x1: (cx - w / 2.0) * sx,
            y1: (cy - h / 2.0) * sy,
            x2: (cx + w / 2.0) * sx,
            y2: (cy + h / 2.0) * sy,
        }
        .clamp_to(params.frame_width as f32, params.frame_height as f32);

        if !bbox.is_well_formed() {
            continue;
        }

        let label = labels
            .get(class)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class));
        candidates.push(Detection::new(label, score, bbox));
    }

    let before = candidates.len();
    let kept = non_max_suppression(candidates, params.iou_threshold);
    debug!("YOLO decode: {} candidates, {} after NMS", before, kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DecodeParams {
        DecodeParams {
            input_size: 640,
            frame_width: 1280,
            frame_height: 640,
            confidence_floor: 0.25,
            iou_threshold: 0.45,
        }
    }

    /// Build a [1, 4 + classes, anchors] tensor from per-anchor rows
    fn tensor(anchors: &[[f32; 6]]) -> Vec<f32> {
        let n = anchors.len();
        let mut out = vec![0.0; 6 * n];
        for (i, a) in anchors.iter().enumerate() {
            for (row, v) in a.iter().enumerate() {
                out[row * n + i] = *v;
            }
        }
        out
    }

    #[test]
    fn test_decode_scales_to_frame() {
        let labels = vec!["car".to_string(), "bus".to_string()];
        let out = tensor(&[[320.0, 320.0, 100.0, 50.0, 0.9, 0.1]]);
        let dets = decode_output(&out, 1, &labels, &params());

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "car");
        assert_eq!(dets[0].bbox, BoundingBox { x1: 540.0, y1: 295.0, x2: 740.0, y2: 345.0 });
    }

    #[test]
    fn test_decode_floor_and_nms() {
        let labels = vec!["car".to_string(), "bus".to_string()];
        let out = tensor(&[
            [100.0, 100.0, 40.0, 40.0, 0.8, 0.0],
            [102.0, 101.0, 40.0, 40.0, 0.7, 0.0],
            [400.0, 400.0, 40.0, 40.0, 0.0, 0.1],
            [500.0, 300.0, 40.0, 40.0, 0.0, 0.6],
        ]);
        let dets = decode_output(&out, 4, &labels, &params());

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].confidence, 0.8);
        assert_eq!(dets[1].label, "bus");
    }

    #[test]
    fn test_decode_unknown_class_label() {
        let out = tensor(&[[320.0, 320.0, 10.0, 10.0, 0.0, 0.9]]);
        let dets = decode_output(&out, 1, &["car".to_string()], &params());
        assert_eq!(dets[0].label, "class_1");
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode_output(&[0.0; 7], 2, &[], &params()).is_empty());
        assert!(decode_output(&[], 0, &[], &params()).is_empty());
    }
}
