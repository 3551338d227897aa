//! Detection model provisioning and inference

pub mod labels;
pub mod manager;
pub mod yolo;

pub use labels::{parse_names_metadata, COCO_CLASSES};
pub use manager::ModelManager;
pub use yolo::{apply_nms, decode_output, preprocess, YoloParams};
#[cfg(feature = "onnx")]
pub use yolo::YoloDetector;
