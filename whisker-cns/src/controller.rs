//! Single owner of the buzzer and the indicator

use crate::action::Action;
use crate::device::{BuzzerDevice, IndicatorDevice};
use std::time::Duration;
use tracing::{debug, info, warn};
use whisker_core::{ActuatorError, Color};

/// Last known state of the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Never driven, or the last write failed
    Unknown,
    Off,
    Lit(Color),
}

/// Keeps the buzzer on while alive; turns it off when released or dropped
struct PulseGuard<'a> {
    buzzer: &'a mut dyn BuzzerDevice,
    released: bool,
}

impl<'a> PulseGuard<'a> {
    fn engage(buzzer: &'a mut dyn BuzzerDevice) -> Result<Self, ActuatorError> {
        buzzer.set(true)?;
        Ok(Self {
            buzzer,
            released: false,
        })
    }

    fn release(mut self) -> Result<(), ActuatorError> {
        self.released = true;
        self.buzzer.set(false)
    }
}

impl Drop for PulseGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.buzzer.set(false) {
                warn!("Failed to silence buzzer after interrupted pulse: {}", e);
            }
        }
    }
}

/// Actuator controller
///
/// Every operation is synchronous: a pulse blocks the caller for its full
/// duration, which is what bounds the loop's detection rate.
pub struct ActuatorController {
    buzzer: Box<dyn BuzzerDevice>,
    indicator: Box<dyn IndicatorDevice>,
    indicator_state: IndicatorState,
}

impl ActuatorController {
    pub fn new(buzzer: Box<dyn BuzzerDevice>, indicator: Box<dyn IndicatorDevice>) -> Self {
        Self {
            buzzer,
            indicator,
            indicator_state: IndicatorState::Unknown,
        }
    }

    /// Buzzer on, block for `duration`, buzzer off
    ///
    /// The buzzer is left off on both normal return and unwinding.
    pub fn pulse_buzzer(&mut self, duration: Duration) -> Result<(), ActuatorError> {
        debug!("Buzzer pulse for {:?}", duration);
        let guard = PulseGuard::engage(self.buzzer.as_mut())?;
        std::thread::sleep(duration);
        guard.release()
    }

    /// Set the indicator; a repeat of the current color does not touch the device
    pub fn set_indicator_color(&mut self, color: Color) -> Result<(), ActuatorError> {
        if self.indicator_state == IndicatorState::Lit(color) {
            return Ok(());
        }

        match self.indicator.set_color(color) {
            Ok(()) => {
                debug!("Indicator set to {}", color);
                self.indicator_state = IndicatorState::Lit(color);
                Ok(())
            }
            Err(e) => {
                self.indicator_state = IndicatorState::Unknown;
                Err(e)
            }
        }
    }

    pub fn indicator_off(&mut self) -> Result<(), ActuatorError> {
        if self.indicator_state == IndicatorState::Off {
            return Ok(());
        }

        match self.indicator.off() {
            Ok(()) => {
                self.indicator_state = IndicatorState::Off;
                Ok(())
            }
            Err(e) => {
                self.indicator_state = IndicatorState::Unknown;
                Err(e)
            }
        }
    }

    pub fn buzzer_off(&mut self) -> Result<(), ActuatorError> {
        self.buzzer.set(false)
    }

    /// Turn every owned output off
    ///
    /// Safe to repeat and safe before any activation. Both outputs are
    /// attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> Result<(), ActuatorError> {
        let indicator = self.indicator_off();
        let buzzer = self.buzzer_off();
        info!("Actuators shut down");
        indicator.and(buzzer)
    }

    /// Carry out one policy action
    pub fn apply(&mut self, action: &Action) -> Result<(), ActuatorError> {
        match action {
            Action::PulseBuzzer(duration) => self.pulse_buzzer(*duration),
            Action::SetIndicator(color) => self.set_indicator_color(*color),
        }
    }

    pub fn indicator_state(&self) -> IndicatorState {
        self.indicator_state
    }
}
