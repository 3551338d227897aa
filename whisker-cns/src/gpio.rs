//! Raspberry Pi GPIO devices (rppal)

use crate::controller::ActuatorController;
use crate::device::{BuzzerDevice, IndicatorDevice};
use rppal::gpio::{Gpio, OutputPin};
use tracing::info;
use whisker_core::{ActuatorError, Color};

/// Software PWM frequency for the indicator channels
const PWM_FREQUENCY_HZ: f64 = 100.0;

fn gpio_err(e: rppal::gpio::Error) -> ActuatorError {
    ActuatorError::Gpio(e.to_string())
}

fn output_pin(gpio: &Gpio, pin: u8, initial_high: bool) -> Result<OutputPin, ActuatorError> {
    let pin = gpio.get(pin).map_err(|e| match e {
        rppal::gpio::Error::PinNotAvailable(p) => ActuatorError::InvalidPin(p),
        other => gpio_err(other),
    })?;
    Ok(if initial_high {
        pin.into_output_high()
    } else {
        pin.into_output_low()
    })
}

/// Active-high buzzer on a single output pin
pub struct GpioBuzzer {
    pin: OutputPin,
}

impl GpioBuzzer {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, ActuatorError> {
        let pin = output_pin(gpio, pin, false)?;
        info!("Buzzer on GPIO{}", pin.pin());
        Ok(Self { pin })
    }
}

impl BuzzerDevice for GpioBuzzer {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// RGB LED on three output pins, one PWM channel per color
pub struct GpioIndicator {
    channels: [OutputPin; 3],
    active_high: bool,
}

impl GpioIndicator {
    /// `active_high` is true for a common-cathode LED
    pub fn new(gpio: &Gpio, pins: (u8, u8, u8), active_high: bool) -> Result<Self, ActuatorError> {
        // Start dark: inactive level is low for common cathode, high for common anode
        let idle_high = !active_high;
        let channels = [
            output_pin(gpio, pins.0, idle_high)?,
            output_pin(gpio, pins.1, idle_high)?,
            output_pin(gpio, pins.2, idle_high)?,
        ];
        info!(
            "Indicator on GPIO{}/{}/{} ({})",
            pins.0,
            pins.1,
            pins.2,
            if active_high { "common cathode" } else { "common anode" }
        );
        Ok(Self {
            channels,
            active_high,
        })
    }

    fn drive(pin: &mut OutputPin, duty: f64) -> Result<(), ActuatorError> {
        if duty <= 0.0 {
            pin.clear_pwm().map_err(gpio_err)?;
            pin.set_low();
        } else if duty >= 1.0 {
            pin.clear_pwm().map_err(gpio_err)?;
            pin.set_high();
        } else {
            pin.set_pwm_frequency(PWM_FREQUENCY_HZ, duty).map_err(gpio_err)?;
        }
        Ok(())
    }
}

impl IndicatorDevice for GpioIndicator {
    fn set_color(&mut self, color: Color) -> Result<(), ActuatorError> {
        let (r, g, b) = color.to_unit();
        let active_high = self.active_high;
        for (pin, level) in self.channels.iter_mut().zip([r, g, b]) {
            let duty = if active_high { level } else { 1.0 - level };
            Self::drive(pin, duty)?;
        }
        Ok(())
    }

    fn off(&mut self) -> Result<(), ActuatorError> {
        self.set_color(Color::BLACK)
    }
}

/// Open the GPIO chip and build a controller over the configured pins
pub fn open_controller(
    buzzer_pin: u8,
    indicator_pins: (u8, u8, u8),
    active_high: bool,
) -> Result<ActuatorController, ActuatorError> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let buzzer = GpioBuzzer::new(&gpio, buzzer_pin)?;
    let indicator = GpioIndicator::new(&gpio, indicator_pins, active_high)?;
    Ok(ActuatorController::new(Box::new(buzzer), Box::new(indicator)))
}
