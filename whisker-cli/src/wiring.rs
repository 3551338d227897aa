// Construction of the loop's collaborators from configuration and flags

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use whisker_cns::{ActuatorController, SimBuzzer, SimIndicator};
use whisker_core::{ClassId, Color, WhiskerConfig};
use whisker_eye::{Detector, FrameSource, LabelMap, PreviewRenderer, ReplaySource};

#[derive(Debug, Clone)]
pub enum SourceArg {
    Camera,
    Replay(PathBuf),
}

pub fn parse_source(value: &str) -> Result<SourceArg, String> {
    match value.trim() {
        "" => Err("source must not be empty".to_string()),
        "camera" => Ok(SourceArg::Camera),
        dir => Ok(SourceArg::Replay(PathBuf::from(dir))),
    }
}

pub fn build_source(
    source: &SourceArg,
    looping: bool,
    config: &WhiskerConfig,
) -> anyhow::Result<Box<dyn FrameSource>> {
    match source {
        SourceArg::Replay(dir) => {
            if !dir.is_dir() {
                anyhow::bail!("Replay source {:?} is not a directory", dir);
            }
            info!("Using replay source {:?}", dir);
            Ok(Box::new(ReplaySource::new(dir.clone()).looping(looping)))
        }
        SourceArg::Camera => camera_source(config),
    }
}

#[cfg(feature = "camera")]
fn camera_source(config: &WhiskerConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(whisker_eye::CameraSource::new(config.camera.clone())))
}

#[cfg(not(feature = "camera"))]
fn camera_source(_config: &WhiskerConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!("Built without the `camera` feature; use --source <dir> to replay images")
}

#[cfg(feature = "onnx")]
pub async fn build_detector(config: &WhiskerConfig) -> anyhow::Result<Box<dyn Detector>> {
    let manager = whisker_eye::ModelManager::new(config.model.clone());
    let detector = manager.provision().await?;
    Ok(Box::new(detector))
}

#[cfg(not(feature = "onnx"))]
pub async fn build_detector(config: &WhiskerConfig) -> anyhow::Result<Box<dyn Detector>> {
    anyhow::bail!(
        "Built without the `onnx` feature; cannot run model {}",
        config.model.name
    )
}

pub fn build_actuators(
    config: &WhiskerConfig,
    simulate: bool,
) -> anyhow::Result<ActuatorController> {
    if simulate {
        info!("Using simulated actuators");
        return Ok(simulated());
    }
    gpio_actuators(config)
}

fn simulated() -> ActuatorController {
    ActuatorController::new(Box::new(SimBuzzer::new()), Box::new(SimIndicator::new()))
}

#[cfg(feature = "gpio")]
fn gpio_actuators(config: &WhiskerConfig) -> anyhow::Result<ActuatorController> {
    Ok(whisker_cns::open_controller(
        config.buzzer_pin,
        config.indicator_pins,
        config.indicator_active_high,
    )?)
}

#[cfg(not(feature = "gpio"))]
fn gpio_actuators(_config: &WhiskerConfig) -> anyhow::Result<ActuatorController> {
    warn!("Built without the `gpio` feature; actuators are simulated");
    Ok(simulated())
}

/// Box colors for the preview, taken from each class's indicator color
pub fn class_colors(config: &WhiskerConfig, labels: &LabelMap) -> HashMap<ClassId, Color> {
    config
        .detection_classes
        .iter()
        .filter_map(|class| Some((*labels.get(&class.label)?, class.indicator_color?)))
        .collect()
}

#[cfg(feature = "camera")]
pub fn build_preview(
    names: HashMap<ClassId, String>,
    colors: HashMap<ClassId, Color>,
) -> Option<Box<dyn PreviewRenderer>> {
    Some(Box::new(whisker_eye::WindowPreview::new(names).with_colors(colors)))
}

#[cfg(not(feature = "camera"))]
pub fn build_preview(
    _names: HashMap<ClassId, String>,
    _colors: HashMap<ClassId, Color>,
) -> Option<Box<dyn PreviewRenderer>> {
    warn!("Built without the `camera` feature; preview disabled");
    None
}
