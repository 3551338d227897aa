//! Device abstraction over the physical outputs

use whisker_core::{ActuatorError, Color};

/// On/off buzzer output
pub trait BuzzerDevice: Send {
    /// Drive the buzzer; setting the current level again is harmless
    fn set(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// Tri-color indicator output
pub trait IndicatorDevice: Send {
    fn set_color(&mut self, color: Color) -> Result<(), ActuatorError>;

    /// All channels dark
    fn off(&mut self) -> Result<(), ActuatorError>;
}
