//! Error types for whisker
//!
//! Each collaborator has its own error enum. The runner decides what stops a
//! run from the variant alone: capture errors are fatal, inference errors
//! are fatal only when [`InferenceError::is_fatal`] says so, and actuator or
//! preview errors are contained within the cycle that raised them.

use thiserror::Error;

/// Failures of the capture device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capture device not started")]
    NotStarted,

    #[error("Capture device disconnected: {0}")]
    Disconnected(String),

    #[error("Frame source exhausted")]
    Exhausted,

    #[error("Capture device error: {0}")]
    Device(String),
}

/// Failures of the inference engine on a single frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    Transient(String),

    #[error("Unrecoverable inference error: {0}")]
    Fatal(String),
}

impl InferenceError {
    /// Whether the engine can no longer produce detections at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, InferenceError::Fatal(_))
    }
}

/// Failures driving the buzzer or the indicator light
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Invalid pin: {0}")]
    InvalidPin(u8),
}

/// Failures of the optional preview window
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    #[error("Preview display error: {0}")]
    Display(String),
}

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Model provisioning failures (startup only)
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Invalid model name: {0}")]
    InvalidName(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error for whisker operations
#[derive(Error, Debug)]
pub enum WhiskerError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Runner error: {0}")]
    Runner(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, WhiskerError>;
