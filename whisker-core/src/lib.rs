//! whisker-core: shared vocabulary of the detection-action loop
//!
//! Holds the data model every other crate speaks (colors, detection classes,
//! detections, frames), the error taxonomy that decides which failures stop
//! a run, and the configuration surface loaded at startup.

pub mod types;
pub mod color;
pub mod frame;
pub mod error;
pub mod config;

pub use types::{BoundingBox, ClassId, Detection, DetectionClass};
pub use color::Color;
pub use frame::Frame;
pub use error::{
    ActuatorError, CaptureError, ConfigError, InferenceError, ModelError, PreviewError,
    Result, WhiskerError,
};
pub use config::{CameraConfig, ModelConfig, WhiskerConfig};
