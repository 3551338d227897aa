//! Inference engine abstraction

use std::collections::HashMap;
use std::time::Duration;
use whisker_core::{ClassId, Detection, Frame, InferenceError};

/// Detector vocabulary: label → class id
pub type LabelMap = HashMap<String, ClassId>;

/// Build a label map from labels listed in class-id order
pub fn label_map_from_names<S: AsRef<str>>(names: &[S]) -> LabelMap {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| (name.as_ref().to_string(), ClassId(id)))
        .collect()
}

/// Inverse of a label map, for captions
pub fn names_by_id(labels: &LabelMap) -> HashMap<ClassId, String> {
    labels.iter().map(|(name, id)| (*id, name.clone())).collect()
}

/// Detections for one frame, consumed once
#[derive(Debug, Clone, Default)]
pub struct Inference {
    detections: Vec<Detection>,
    /// Wall time the model spent on this frame
    pub inference_time: Duration,
}

impl Inference {
    pub fn new(detections: Vec<Detection>, inference_time: Duration) -> Self {
        Self {
            detections,
            inference_time,
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

impl IntoIterator for Inference {
    type Item = Detection;
    type IntoIter = std::vec::IntoIter<Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.into_iter()
    }
}

/// Object detector
///
/// `labels` is fixed for the detector's lifetime. `infer` is bounded by the
/// model's own inference time; it never waits on anything else.
pub trait Detector: Send {
    fn labels(&self) -> &LabelMap;

    fn infer(&mut self, frame: &Frame) -> Result<Inference, InferenceError>;
}
