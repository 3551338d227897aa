// Configuration files feeding the runner

mod support;

use std::io::Write;
use support::*;
use tempfile::NamedTempFile;
use whisker_cns::{ActuatorController, SimBuzzer, SimIndicator};
use whisker_core::{Color, Detection, WhiskerConfig};
use whisker_wld::DetectionLoopRunner;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_runner_from_config_file() {
    let file = config_file(
        r##"
show_preview = false
idle_color = "yellow"
buzz_duration_ms = 5

[[detection_classes]]
label = "dog"
confidence_threshold = 0.6
indicator_color = "#ff8000"
triggers_buzzer = false
"##,
    );
    let config = WhiskerConfig::load(Some(file.path())).unwrap();
    assert!(!config.show_preview);

    let buzzer = SimBuzzer::new();
    let indicator = SimIndicator::new();
    let actuators = ActuatorController::new(Box::new(buzzer.clone()), Box::new(indicator.clone()));
    let detector = FakeDetector::new(vec![Ok(vec![Detection::new(class_id("dog"), 0.65)])]);
    let mut runner = DetectionLoopRunner::from_config(
        &config,
        Box::new(FakeSource::endless(Default::default())),
        Box::new(detector),
        actuators,
    )
    .unwrap();

    runner.start().unwrap();
    assert_eq!(indicator.color(), Some(Color::YELLOW));
    runner.run_cycle();
    assert_eq!(indicator.color(), Some(Color::rgb(0xff, 0x80, 0x00)));
    assert_eq!(buzzer.pulse_count(), 0);
}

#[test]
fn test_duplicate_labels_in_file_rejected() {
    let file = config_file(
        r#"
[[detection_classes]]
label = "cat"
confidence_threshold = 0.5

[[detection_classes]]
label = "cat"
confidence_threshold = 0.9
"#,
    );
    assert!(WhiskerConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_out_of_range_threshold_rejected() {
    let file = config_file(
        r#"
[[detection_classes]]
label = "cat"
confidence_threshold = 1.5
"#,
    );
    assert!(WhiskerConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_default_registry_against_coco_labels() {
    let config = WhiskerConfig::default();
    let detector = FakeDetector::new(vec![]);
    let runner = DetectionLoopRunner::from_config(
        &config,
        Box::new(FakeSource::endless(Default::default())),
        Box::new(detector),
        ActuatorController::new(Box::new(SimBuzzer::new()), Box::new(SimIndicator::new())),
    )
    .unwrap();

    // cat, teddy bear and person are all in the fake vocabulary
    assert_eq!(runner.policy().resolve_index().len(), 3);
}
