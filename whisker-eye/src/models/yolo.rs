//! YOLO object detection model
//!
//! Decoding is kept free of the runtime so it can be exercised on any
//! host; only [`YoloDetector`] needs ONNX Runtime (feature `onnx`).

use image::imageops::{self, FilterType};
use std::cmp::Ordering;
use tracing::debug;
use whisker_core::{BoundingBox, ClassId, Detection, Frame, InferenceError, ModelConfig};

/// Decoding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct YoloParams {
    /// Square model input edge in pixels
    pub input_size: u32,
    /// Scores below this are dropped before suppression
    pub score_floor: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            score_floor: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

impl From<&ModelConfig> for YoloParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            input_size: config.input_size,
            score_floor: config.score_floor,
            iou_threshold: config.iou_threshold,
            ..Self::default()
        }
    }
}

/// Resize to the model input and lay out as CHW float in [0, 1]
pub fn preprocess(frame: &Frame, input_size: u32) -> Vec<f32> {
    let resized = imageops::resize(&frame.image, input_size, input_size, FilterType::Triangle);
    let plane = (input_size * input_size) as usize;
    let mut tensor = vec![0.0f32; plane * 3];
    for (i, pixel) in resized.pixels().enumerate() {
        tensor[i] = pixel[0] as f32 / 255.0;
        tensor[plane + i] = pixel[1] as f32 / 255.0;
        tensor[2 * plane + i] = pixel[2] as f32 / 255.0;
    }
    tensor
}

/// Decode a `[1, 4 + num_classes, anchors]` output (YOLOv8 / YOLO11 layout)
///
/// Each anchor contributes at most one detection, its best-scoring class.
/// Boxes are rescaled from model input space to frame pixels and clipped.
pub fn decode_output(
    values: &[f32],
    shape: &[usize],
    num_classes: usize,
    frame_size: (u32, u32),
    params: &YoloParams,
) -> Result<Vec<Detection>, InferenceError> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(InferenceError::Fatal(format!("Unexpected output shape {:?}", shape)));
    }
    let (rows, anchors) = (shape[1], shape[2]);
    if rows != 4 + num_classes {
        return Err(InferenceError::Fatal(format!(
            "Output has {} rows, expected {} for {} classes",
            rows,
            4 + num_classes,
            num_classes
        )));
    }
    if values.len() != rows * anchors {
        return Err(InferenceError::Fatal(format!(
            "Output holds {} values, shape {:?} needs {}",
            values.len(),
            shape,
            rows * anchors
        )));
    }

    let (frame_w, frame_h) = (frame_size.0 as f32, frame_size.1 as f32);
    if frame_w <= 0.0 || frame_h <= 0.0 || params.input_size == 0 {
        return Ok(Vec::new());
    }
    let scale_x = frame_w / params.input_size as f32;
    let scale_y = frame_h / params.input_size as f32;
    let at = |row: usize, anchor: usize| values[row * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..num_classes {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if !best_score.is_finite() || best_score < params.score_floor {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        if ![cx, cy, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
            continue;
        }

        let left = ((cx - w / 2.0) * scale_x).clamp(0.0, frame_w);
        let top = ((cy - h / 2.0) * scale_y).clamp(0.0, frame_h);
        let right = ((cx + w / 2.0) * scale_x).clamp(0.0, frame_w);
        let bottom = ((cy + h / 2.0) * scale_y).clamp(0.0, frame_h);
        if right <= left || bottom <= top {
            continue;
        }

        candidates.push(
            Detection::new(ClassId(best_class), best_score.min(1.0))
                .with_bbox(BoundingBox::new(left, top, right - left, bottom - top)),
        );
    }

    let mut kept = apply_nms(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);
    debug!("YOLO decoded {} detections", kept.len());
    Ok(kept)
}

/// Per-class non-maximum suppression; output sorted by confidence, descending
pub fn apply_nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.retain(|d| d.confidence.is_finite());
    detections.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(feature = "onnx")]
pub use runtime::YoloDetector;

#[cfg(feature = "onnx")]
mod runtime {
    use super::{decode_output, preprocess, YoloParams};
    use crate::detector::{label_map_from_names, Detector, Inference, LabelMap};
    use crate::models::labels::{parse_names_metadata, COCO_CLASSES};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use std::path::Path;
    use std::time::Instant;
    use tracing::{info, warn};
    use whisker_core::{Frame, InferenceError, ModelError};

    /// YOLO detector backed by an ONNX Runtime session
    pub struct YoloDetector {
        session: Session,
        labels: LabelMap,
        num_classes: usize,
        params: YoloParams,
    }

    impl YoloDetector {
        pub fn load(model_path: &Path, params: YoloParams) -> Result<Self, ModelError> {
            let load_err = |e: &dyn std::fmt::Display| {
                ModelError::Load(format!("Failed to load {:?}: {}", model_path, e))
            };
            let session = Session::builder()
                .map_err(|e| load_err(&e))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| load_err(&e))?
                .commit_from_file(model_path)
                .map_err(|e| load_err(&e))?;

            let names = session
                .metadata()
                .ok()
                .and_then(|meta| meta.custom("names").ok().flatten())
                .and_then(|text| parse_names_metadata(&text));
            let names: Vec<String> = match names {
                Some(names) => names,
                None => {
                    warn!("Model {:?} carries no class names, assuming COCO", model_path);
                    COCO_CLASSES.iter().map(|s| s.to_string()).collect()
                }
            };

            info!("YOLO model loaded from {:?} ({} classes)", model_path, names.len());
            Ok(Self {
                session,
                num_classes: names.len(),
                labels: label_map_from_names(&names),
                params,
            })
        }
    }

    impl Detector for YoloDetector {
        fn labels(&self) -> &LabelMap {
            &self.labels
        }

        fn infer(&mut self, frame: &Frame) -> Result<Inference, InferenceError> {
            let started = Instant::now();
            let size = self.params.input_size as usize;
            let input = preprocess(frame, self.params.input_size);

            let tensor = Tensor::from_array(([1usize, 3, size, size], input))
                .map_err(|e| InferenceError::Transient(format!("Failed to build input tensor: {}", e)))?;
            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .map_err(|e| InferenceError::Transient(format!("YOLO inference failed: {}", e)))?;
            let (shape, values) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Fatal(format!("Failed to extract output tensor: {}", e)))?;
            let shape: Vec<usize> = shape.iter().map(|d| (*d).max(0) as usize).collect();

            let detections = decode_output(
                values,
                &shape,
                self.num_classes,
                (frame.width(), frame.height()),
                &self.params,
            )?;
            Ok(Inference::new(detections, started.elapsed()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Build a `[1, 4 + classes, anchors]` tensor from per-anchor rows
    fn tensor(anchors: &[([f32; 4], Vec<f32>)]) -> (Vec<f32>, Vec<usize>) {
        let classes = anchors[0].1.len();
        let rows = 4 + classes;
        let n = anchors.len();
        let mut values = vec![0.0f32; rows * n];
        for (a, (bbox, scores)) in anchors.iter().enumerate() {
            for r in 0..4 {
                values[r * n + a] = bbox[r];
            }
            for (c, score) in scores.iter().enumerate() {
                values[(4 + c) * n + a] = *score;
            }
        }
        (values, vec![1, rows, n])
    }

    fn params() -> YoloParams {
        YoloParams {
            input_size: 100,
            ..YoloParams::default()
        }
    }

    #[test]
    fn test_decode_picks_best_class_and_rescales() {
        let (values, shape) = tensor(&[([50.0, 50.0, 20.0, 10.0], vec![0.1, 0.9])]);
        let detections = decode_output(&values, &shape, 2, (200, 100), &params()).unwrap();
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(d.class_id, ClassId(1));
        assert!((d.confidence - 0.9).abs() < 1e-6);
        // x scaled by 2, y by 1
        assert!((d.bbox.x - 80.0).abs() < 1e-4);
        assert!((d.bbox.y - 45.0).abs() < 1e-4);
        assert!((d.bbox.width - 40.0).abs() < 1e-4);
        assert!((d.bbox.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_decode_drops_scores_below_floor() {
        let (values, shape) = tensor(&[
            ([50.0, 50.0, 20.0, 20.0], vec![0.2, 0.1]),
            ([10.0, 10.0, 5.0, 5.0], vec![0.3, 0.0]),
        ]);
        let detections = decode_output(&values, &shape, 2, (100, 100), &params()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, ClassId(0));
    }

    #[test]
    fn test_decode_suppresses_overlapping_same_class() {
        let (values, shape) = tensor(&[
            ([50.0, 50.0, 20.0, 20.0], vec![0.8, 0.0]),
            ([51.0, 50.0, 20.0, 20.0], vec![0.7, 0.0]),
            ([51.0, 50.0, 20.0, 20.0], vec![0.0, 0.6]),
        ]);
        let detections = decode_output(&values, &shape, 2, (100, 100), &params()).unwrap();
        let ids: Vec<ClassId> = detections.iter().map(|d| d.class_id).collect();
        // the other class survives at the same spot
        assert_eq!(ids, vec![ClassId(0), ClassId(1)]);
        assert!((detections[0].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_decode_clips_to_frame() {
        let (values, shape) = tensor(&[([5.0, 5.0, 20.0, 20.0], vec![0.9])]);
        let detections = decode_output(&values, &shape, 1, (100, 100), &params()).unwrap();
        let bbox = detections[0].bbox;
        assert_eq!(bbox.x, 0.0);
        assert_eq!(bbox.y, 0.0);
        assert!((bbox.width - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_decode_rejects_mismatched_class_count() {
        let (values, shape) = tensor(&[([5.0, 5.0, 2.0, 2.0], vec![0.9, 0.1])]);
        let err = decode_output(&values, &shape, 80, (100, 100), &params()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let err = decode_output(&[0.0; 5], &[1, 6, 2], 2, (100, 100), &params()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_decode_respects_max_detections() {
        let anchors: Vec<([f32; 4], Vec<f32>)> = (0..10)
            .map(|i| ([5.0 + i as f32 * 9.0, 50.0, 4.0, 4.0], vec![0.5 + i as f32 * 0.01]))
            .collect();
        let (values, shape) = tensor(&anchors);
        let limited = YoloParams {
            max_detections: 3,
            ..params()
        };
        let detections = decode_output(&values, &shape, 1, (100, 100), &limited).unwrap();
        assert_eq!(detections.len(), 3);
        assert!(detections[0].confidence >= detections[1].confidence);
    }

    #[test]
    fn test_preprocess_layout() {
        let image = RgbImage::from_pixel(8, 4, Rgb([255, 0, 51]));
        let frame = Frame::new(image, 0);
        let tensor = preprocess(&frame, 4);
        assert_eq!(tensor.len(), 3 * 16);
        assert!((tensor[0] - 1.0).abs() < 1e-6);
        assert!(tensor[16].abs() < 1e-6);
        assert!((tensor[32] - 0.2).abs() < 1e-6);
    }
}
