//! In-memory actuator devices
//!
//! Clones share state, so a caller can hand one clone to the controller and
//! keep another to observe what the hardware would be doing.

use crate::device::{BuzzerDevice, IndicatorDevice};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use whisker_core::{ActuatorError, Color};

/// Ordered record of device calls shared between collaborators
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[derive(Debug, Default)]
struct BuzzerState {
    on: bool,
    pulses: u32,
    failing: bool,
}

/// Simulated buzzer
#[derive(Debug, Clone, Default)]
pub struct SimBuzzer {
    state: Arc<Mutex<BuzzerState>>,
    journal: Option<EventJournal>,
}

impl SimBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every call into `journal` as `buzzer-on` / `buzzer-off`
    pub fn with_journal(mut self, journal: EventJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().on
    }

    /// Number of off→on transitions seen so far
    pub fn pulse_count(&self) -> u32 {
        self.state.lock().pulses
    }

    /// Make every following call fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Put the simulated output high without going through a pulse
    pub fn force_on(&self) {
        self.state.lock().on = true;
    }
}

impl BuzzerDevice for SimBuzzer {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if let Some(journal) = &self.journal {
            journal.record(if on { "buzzer-on" } else { "buzzer-off" });
        }

        let mut state = self.state.lock();
        if state.failing {
            return Err(ActuatorError::Gpio("simulated buzzer failure".to_string()));
        }
        if on && !state.on {
            state.pulses += 1;
        }
        state.on = on;
        debug!("Simulated buzzer {}", if on { "on" } else { "off" });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct IndicatorStateSim {
    color: Option<Color>,
    writes: u32,
    failing: bool,
}

/// Simulated tri-color indicator
#[derive(Debug, Clone, Default)]
pub struct SimIndicator {
    state: Arc<Mutex<IndicatorStateSim>>,
    journal: Option<EventJournal>,
}

impl SimIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every call into `journal` as `indicator-<color>` / `indicator-off`
    pub fn with_journal(mut self, journal: EventJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Current color, `None` when dark
    pub fn color(&self) -> Option<Color> {
        self.state.lock().color
    }

    /// Number of color writes that reached the device
    pub fn write_count(&self) -> u32 {
        self.state.lock().writes
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

impl IndicatorDevice for SimIndicator {
    fn set_color(&mut self, color: Color) -> Result<(), ActuatorError> {
        if let Some(journal) = &self.journal {
            journal.record(format!("indicator-{}", color));
        }

        let mut state = self.state.lock();
        if state.failing {
            return Err(ActuatorError::Gpio("simulated indicator failure".to_string()));
        }
        state.color = if color.is_off() { None } else { Some(color) };
        state.writes += 1;
        debug!("Simulated indicator set to {}", color);
        Ok(())
    }

    fn off(&mut self) -> Result<(), ActuatorError> {
        if let Some(journal) = &self.journal {
            journal.record("indicator-off");
        }

        let mut state = self.state.lock();
        if state.failing {
            return Err(ActuatorError::Gpio("simulated indicator failure".to_string()));
        }
        state.color = None;
        Ok(())
    }
}
