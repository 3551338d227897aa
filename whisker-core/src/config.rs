//! Configuration for whisker
//!
//! Sources are layered with the `config` crate: built-in defaults, then an
//! optional TOML/YAML/JSON file, then `WHISKER__*` environment variables
//! (`WHISKER__SHOW_PREVIEW=false`, `WHISKER__CAMERA__CAMERA_ID=1`, ...).

use crate::color::Color;
use crate::error::ConfigError;
use crate::types::DetectionClass;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "WHISKER";

/// Capture device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index (0, 1, 2, etc.)
    pub camera_id: u32,
    /// Capture resolution (width, height)
    pub resolution: (u32, u32),
    /// Requested frame rate
    pub frame_rate: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            resolution: (1280, 1280),
            frame_rate: 30,
        }
    }
}

/// Detection model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier; the artifact is `<model_dir>/<name>.onnx`
    pub name: String,
    pub model_dir: PathBuf,
    /// Where to fetch the artifact from when it is missing
    pub download_url: Option<String>,
    /// Expected SHA-256 of the artifact (hex)
    pub checksum: Option<String>,
    /// Square model input edge in pixels
    pub input_size: u32,
    /// Scores below this never leave the detector
    pub score_floor: f32,
    /// Overlap above which same-class boxes are suppressed
    pub iou_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "yolo11n".to_string(),
            model_dir: PathBuf::from(".models/"),
            download_url: None,
            checksum: None,
            input_size: 640,
            score_floor: 0.25,
            iou_threshold: 0.45,
        }
    }
}

/// Whole-process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiskerConfig {
    /// Render the annotated preview window
    pub show_preview: bool,
    /// Classes that trigger actuators, in evaluation order
    pub detection_classes: Vec<DetectionClass>,
    /// BCM pin of the buzzer
    pub buzzer_pin: u8,
    /// BCM pins of the red, green and blue indicator channels
    pub indicator_pins: (u8, u8, u8),
    /// true for a common-cathode LED (channels active high)
    pub indicator_active_high: bool,
    /// Indicator color while running with nothing detected yet
    pub idle_color: Color,
    /// Length of one buzzer pulse
    pub buzz_duration_ms: u64,
    pub camera: CameraConfig,
    pub model: ModelConfig,
}

impl Default for WhiskerConfig {
    fn default() -> Self {
        Self {
            show_preview: true,
            detection_classes: default_detection_classes(),
            buzzer_pin: 17,
            indicator_pins: (5, 6, 13),
            indicator_active_high: false,
            idle_color: Color::GREEN,
            buzz_duration_ms: 100,
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// Built-in registry: a high-alert class, a secondary class, and a class
/// that is recognised but suppressed
pub fn default_detection_classes() -> Vec<DetectionClass> {
    vec![
        DetectionClass::new("cat", 0.5).with_color(Color::RED),
        DetectionClass::new("teddy bear", 0.5).with_color(Color::BLUE),
        DetectionClass::new("person", 0.8).with_buzzer(false),
    ]
}

impl WhiskerConfig {
    /// Load defaults, then `path` (if given), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let loaded: WhiskerConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn buzz_duration(&self) -> Duration {
        Duration::from_millis(self.buzz_duration_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Duplicate labels are rejected rather than resolved last-wins
        let mut seen = HashSet::new();
        for class in &self.detection_classes {
            class.validate()?;
            if !seen.insert(class.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate detection class label: '{}'",
                    class.label
                )));
            }
        }

        let (r, g, b) = self.indicator_pins;
        let pins = [self.buzzer_pin, r, g, b];
        let distinct: HashSet<u8> = pins.iter().copied().collect();
        if distinct.len() != pins.len() {
            return Err(ConfigError::Invalid(format!(
                "Buzzer and indicator pins must be distinct, got buzzer {} and indicator {:?}",
                self.buzzer_pin, self.indicator_pins
            )));
        }

        if self.buzz_duration_ms == 0 {
            return Err(ConfigError::Invalid("buzz_duration_ms must be > 0".to_string()));
        }

        if self.camera.frame_rate == 0 || self.camera.frame_rate > 120 {
            return Err(ConfigError::Invalid("Frame rate must be between 1 and 120".to_string()));
        }
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Invalid("Resolution must be non-zero".to_string()));
        }

        if self.model.name.trim().is_empty() {
            return Err(ConfigError::Invalid("Model name must not be empty".to_string()));
        }
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(ConfigError::Invalid(format!(
                "Model input size must be a positive multiple of 32, got {}",
                self.model.input_size
            )));
        }
        if !(0.0..=1.0).contains(&self.model.score_floor) {
            return Err(ConfigError::Invalid("score_floor must be between 0.0 and 1.0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.model.iou_threshold) {
            return Err(ConfigError::Invalid("iou_threshold must be between 0.0 and 1.0".to_string()));
        }

        Ok(())
    }
}
