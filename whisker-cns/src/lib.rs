//! whisker-cns: actuator side of the detection loop
//!
//! Provides:
//! - Device traits for the buzzer and the tri-color indicator
//! - `ActuatorController`, the single owner of both devices
//! - Simulated devices for hosts without GPIO and for tests
//! - Raspberry Pi GPIO devices (feature `gpio`)

pub mod action;
pub mod device;
pub mod controller;
pub mod sim;
#[cfg(feature = "gpio")]
pub mod gpio;

pub use action::Action;
pub use device::{BuzzerDevice, IndicatorDevice};
pub use controller::{ActuatorController, IndicatorState};
pub use sim::{EventJournal, SimBuzzer, SimIndicator};
#[cfg(feature = "gpio")]
pub use gpio::{open_controller, GpioBuzzer, GpioIndicator};
