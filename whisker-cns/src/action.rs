//! Actuator commands emitted by the class policy

use std::fmt;
use std::time::Duration;
use whisker_core::Color;

/// A single physical response to a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Buzzer on for the duration, then off
    PulseBuzzer(Duration),
    /// Switch the indicator to a color
    SetIndicator(Color),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PulseBuzzer(duration) => write!(f, "pulse buzzer {}ms", duration.as_millis()),
            Action::SetIndicator(color) => write!(f, "set indicator {}", color),
        }
    }
}
