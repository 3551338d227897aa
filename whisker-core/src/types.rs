use crate::color::Color;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric class identifier as emitted by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union; 0.0 for degenerate or non-finite boxes
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let values = [
            self.x, self.y, self.width, self.height,
            other.x, other.y, other.width, other.height,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return 0.0;
        }
        if self.width <= 0.0 || self.height <= 0.0 || other.width <= 0.0 || other.height <= 0.0 {
            return 0.0;
        }

        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= left || bottom <= top {
            return 0.0;
        }

        let intersection = (right - left) * (bottom - top);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 || !union.is_finite() {
            return 0.0;
        }
        (intersection / union).clamp(0.0, 1.0)
    }
}

/// One object found in one frame. Produced and consumed within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: ClassId,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: ClassId, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
            bbox: BoundingBox::default(),
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }
}

fn default_triggers_buzzer() -> bool {
    true
}

/// A class label the loop reacts to, and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionClass {
    /// Label as it appears in the detector's vocabulary
    pub label: String,
    /// Minimum confidence (inclusive) for the class to trigger anything
    pub confidence_threshold: f32,
    /// Color the indicator switches to, if any
    #[serde(default)]
    pub indicator_color: Option<Color>,
    /// Whether the buzzer pulses
    #[serde(default = "default_triggers_buzzer")]
    pub triggers_buzzer: bool,
}

impl DetectionClass {
    /// Buzzing class without a color
    pub fn new(label: impl Into<String>, confidence_threshold: f32) -> Self {
        Self {
            label: label.into(),
            confidence_threshold,
            indicator_color: None,
            triggers_buzzer: true,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.indicator_color = Some(color);
        self
    }

    pub fn with_buzzer(mut self, triggers_buzzer: bool) -> Self {
        self.triggers_buzzer = triggers_buzzer;
        self
    }

    /// True when `confidence` reaches this class's threshold
    pub fn accepts(&self, confidence: f32) -> bool {
        confidence.is_finite() && confidence >= self.confidence_threshold
    }

    /// Whether a detection of this class does anything at all
    pub fn has_action(&self) -> bool {
        self.triggers_buzzer || self.indicator_color.is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label.trim().is_empty() {
            return Err(ConfigError::Invalid("Detection class label must not be empty".to_string()));
        }
        if !self.confidence_threshold.is_finite() || !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "Confidence threshold for '{}' must be between 0.0 and 1.0, got {}",
                self.label, self.confidence_threshold
            )));
        }
        Ok(())
    }
}
