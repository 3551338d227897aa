// Fakes shared by the integration tests; every call lands in one journal
#![allow(dead_code)]

use image::RgbImage;
use std::collections::VecDeque;
use std::time::Duration;
use whisker_cns::{ActuatorController, EventJournal, SimBuzzer, SimIndicator};
use whisker_core::{
    CaptureError, ClassId, Color, Detection, DetectionClass, Frame, InferenceError, PreviewError,
};
use whisker_eye::detector::label_map_from_names;
use whisker_eye::{Detector, FrameSource, Inference, LabelMap, PreviewRenderer, PreviewSignal};
use whisker_wld::{DetectionClassPolicy, DetectionLoopRunner};

pub const LABELS: &[&str] = &["person", "bicycle", "cat", "dog", "teddy bear"];
pub const BUZZ: Duration = Duration::from_millis(1);

pub fn class_id(label: &str) -> ClassId {
    ClassId(LABELS.iter().position(|l| *l == label).unwrap())
}

pub fn frame(sequence: u64) -> Frame {
    Frame::new(RgbImage::new(8, 8), sequence)
}

/// Endless source, optionally failing from a given capture onwards
pub struct FakeSource {
    journal: EventJournal,
    fail_at: Option<u64>,
    captured: u64,
    started: bool,
}

impl FakeSource {
    pub fn endless(journal: EventJournal) -> Self {
        Self {
            journal,
            fail_at: None,
            captured: 0,
            started: false,
        }
    }

    /// The `n`-th capture (1-based) and every later one fail
    pub fn failing_at(journal: EventJournal, n: u64) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::endless(journal)
        }
    }
}

impl FrameSource for FakeSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.journal.record("source-start");
        self.started = true;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        self.captured += 1;
        if self.fail_at.map_or(false, |n| self.captured >= n) {
            return Err(CaptureError::Disconnected("cable pulled".to_string()));
        }
        Ok(frame(self.captured - 1))
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.journal.record("source-stop");
        self.started = false;
        Ok(())
    }
}

/// Detector answering each frame from a script, then with nothing
pub struct FakeDetector {
    labels: LabelMap,
    script: VecDeque<Result<Vec<Detection>, InferenceError>>,
}

impl FakeDetector {
    pub fn new(script: Vec<Result<Vec<Detection>, InferenceError>>) -> Self {
        Self {
            labels: label_map_from_names(LABELS),
            script: script.into(),
        }
    }

    pub fn every_frame(detections: Vec<Detection>, frames: usize) -> Self {
        Self::new(vec![Ok(detections); frames])
    }
}

impl Detector for FakeDetector {
    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Inference, InferenceError> {
        let detections = self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(Inference::new(detections, Duration::from_millis(25)))
    }
}

/// Preview that asks to quit on a given render
pub struct FakePreview {
    journal: EventJournal,
    quit_on: u64,
    renders: u64,
}

impl FakePreview {
    pub fn quitting_on(journal: EventJournal, render: u64) -> Self {
        Self {
            journal,
            quit_on: render,
            renders: 0,
        }
    }
}

impl PreviewRenderer for FakePreview {
    fn render(
        &mut self,
        _frame: &Frame,
        _detections: &[Detection],
        _throughput: Option<f32>,
    ) -> Result<PreviewSignal, PreviewError> {
        self.renders += 1;
        if self.renders >= self.quit_on {
            Ok(PreviewSignal::Quit)
        } else {
            Ok(PreviewSignal::Continue)
        }
    }

    fn release(&mut self) -> Result<(), PreviewError> {
        self.journal.record("preview-release");
        Ok(())
    }
}

pub fn cat_registry() -> Vec<DetectionClass> {
    vec![DetectionClass::new("cat", 0.5).with_color(Color::RED)]
}

/// A runner over simulated actuators, plus handles to observe them
pub struct Rig {
    pub runner: DetectionLoopRunner,
    pub buzzer: SimBuzzer,
    pub indicator: SimIndicator,
    pub journal: EventJournal,
}

impl Rig {
    pub fn new(
        classes: Vec<DetectionClass>,
        source: impl FnOnce(EventJournal) -> Box<dyn FrameSource>,
        detector: FakeDetector,
    ) -> Self {
        let journal = EventJournal::new();
        let buzzer = SimBuzzer::new().with_journal(journal.clone());
        let indicator = SimIndicator::new().with_journal(journal.clone());
        let actuators =
            ActuatorController::new(Box::new(buzzer.clone()), Box::new(indicator.clone()));
        let policy = DetectionClassPolicy::new(classes, detector.labels(), BUZZ).unwrap();
        let runner = DetectionLoopRunner::new(
            source(journal.clone()),
            Box::new(detector),
            policy,
            actuators,
        );
        Self {
            runner,
            buzzer,
            indicator,
            journal,
        }
    }

    pub fn endless(classes: Vec<DetectionClass>, detector: FakeDetector) -> Self {
        Self::new(
            classes,
            |journal| Box::new(FakeSource::endless(journal)),
            detector,
        )
    }
}
