//! whisker-eye: perception side of the detection loop
//!
//! Frame sources (camera, directory replay), the detector abstraction with
//! its YOLO implementation, model provisioning, and the optional preview
//! window. Hardware-bound pieces sit behind the `opencv` and `onnx` features.

pub mod source;
pub mod replay;
#[cfg(feature = "opencv")]
pub mod camera;
pub mod detector;
pub mod models;
pub mod preview;
#[cfg(feature = "opencv")]
pub mod window;

pub use source::FrameSource;
pub use replay::ReplaySource;
#[cfg(feature = "opencv")]
pub use camera::CameraSource;
pub use detector::{Detector, Inference, LabelMap};
pub use models::ModelManager;
pub use preview::{throughput, PreviewRenderer, PreviewSignal};
#[cfg(feature = "opencv")]
pub use window::WindowPreview;
