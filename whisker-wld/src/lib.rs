//! whisker-wld: the detection-action loop
//!
//! `DetectionClassPolicy` turns a frame's detections into actuator actions;
//! `DetectionLoopRunner` owns the frame source, detector, optional preview
//! and actuators, and drives them through the Idle → Running → Stopping →
//! Stopped lifecycle.

pub mod policy;
pub mod runner;

pub use policy::{ClassIdIndex, DetectionClassPolicy};
pub use runner::{DetectionLoopRunner, RunnerState, RunnerStats, StopHandle, StopReason};
