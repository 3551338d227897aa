//! Exercise the buzzer and every indicator color once
//!
//! Runs against simulated devices by default; with `--features gpio` and
//! `--gpio` it drives the real pins (buzzer 17, indicator 5/6/13).

use std::thread;
use std::time::Duration;
use whisker_cns::{Action, ActuatorController, EventJournal, SimBuzzer, SimIndicator};
use whisker_core::Color;

fn controller(journal: &EventJournal) -> Result<ActuatorController, Box<dyn std::error::Error>> {
    #[cfg(feature = "gpio")]
    if std::env::args().any(|a| a == "--gpio") {
        return Ok(whisker_cns::open_controller(17, (5, 6, 13), false)?);
    }

    Ok(ActuatorController::new(
        Box::new(SimBuzzer::new().with_journal(journal.clone())),
        Box::new(SimIndicator::new().with_journal(journal.clone())),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let journal = EventJournal::new();
    let mut actuators = controller(&journal)?;

    let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW, Color::WHITE];
    for color in colors {
        println!("Indicator -> {}", color);
        actuators.apply(&Action::SetIndicator(color))?;
        thread::sleep(Duration::from_millis(500));
    }

    println!("Buzzer pulse");
    actuators.apply(&Action::PulseBuzzer(Duration::from_millis(200)))?;

    actuators.shutdown()?;
    for entry in journal.entries() {
        println!("  {}", entry);
    }
    Ok(())
}
