//! Detection loop runner
//!
//! Drives capture → inference → (preview) → policy → actuators, one cycle at
//! a time on the calling thread. The runner owns every collaborator for its
//! whole lifetime and releases them in a fixed order when it stops.

use crate::policy::DetectionClassPolicy;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use whisker_cns::ActuatorController;
use whisker_core::{Color, ConfigError, WhiskerConfig, WhiskerError};
use whisker_eye::{throughput, Detector, FrameSource, PreviewRenderer, PreviewSignal};

/// Lifecycle of one runner instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Stopping,
    /// Terminal; a runner is never restarted
    Stopped,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Idle => "idle",
            RunnerState::Running => "running",
            RunnerState::Stopping => "stopping",
            RunnerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Preview quit key or an external stop request
    UserRequested,
    CaptureFailed,
    InferenceFailed,
    /// The frame source could not be acquired
    StartFailed,
}

impl StopReason {
    /// Whether the run ended the way an operator asked it to
    pub fn is_clean(self) -> bool {
        self == StopReason::UserRequested
    }
}

/// Counters kept across cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub cycles: u64,
    pub skipped_cycles: u64,
    pub actions_applied: u64,
    pub actuator_failures: u64,
}

/// External stop request, shared with signal handlers
///
/// Observed by the runner once per cycle; it never interrupts a capture or
/// an inference already in progress.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn request_stop(&self) {
        if !self.tx.send_replace(true) {
            info!("Stop requested");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that flips to `true` once a stop is requested
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The detection-action loop
pub struct DetectionLoopRunner {
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    policy: DetectionClassPolicy,
    actuators: ActuatorController,
    preview: Option<Box<dyn PreviewRenderer>>,
    idle_color: Color,
    stop: StopHandle,
    state: RunnerState,
    stop_reason: Option<StopReason>,
    stats: RunnerStats,
}

impl DetectionLoopRunner {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        policy: DetectionClassPolicy,
        actuators: ActuatorController,
    ) -> Self {
        Self {
            source,
            detector,
            policy,
            actuators,
            preview: None,
            idle_color: Color::GREEN,
            stop: StopHandle::new(),
            state: RunnerState::Idle,
            stop_reason: None,
            stats: RunnerStats::default(),
        }
    }

    /// Build the policy from the configuration against the detector's labels
    ///
    /// The preview is not attached here; callers decide on `show_preview`.
    pub fn from_config(
        config: &WhiskerConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        actuators: ActuatorController,
    ) -> Result<Self, ConfigError> {
        let policy = DetectionClassPolicy::new(
            config.detection_classes.clone(),
            detector.labels(),
            config.buzz_duration(),
        )?;
        Ok(Self::new(source, detector, policy, actuators).with_idle_color(config.idle_color))
    }

    pub fn with_preview(mut self, preview: Box<dyn PreviewRenderer>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Indicator color shown while running with nothing detected yet
    pub fn with_idle_color(mut self, color: Color) -> Self {
        self.idle_color = color;
        self
    }

    /// Share an existing stop handle instead of the runner's own
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn stats(&self) -> RunnerStats {
        self.stats
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn policy(&self) -> &DetectionClassPolicy {
        &self.policy
    }

    /// Acquire the frame source and light the idle color
    pub fn start(&mut self) -> Result<(), WhiskerError> {
        if self.state != RunnerState::Idle {
            return Err(WhiskerError::Runner(format!(
                "Cannot start a runner that is {}",
                self.state
            )));
        }

        if let Err(e) = self.source.start() {
            error!("Failed to start frame source: {}", e);
            self.begin_stopping(StopReason::StartFailed);
            return Err(e.into());
        }

        self.policy.resolve_index();
        if let Err(e) = self.actuators.set_indicator_color(self.idle_color) {
            warn!("Failed to set idle indicator color: {}", e);
            self.stats.actuator_failures += 1;
        }

        self.state = RunnerState::Running;
        info!("Detection loop running");
        Ok(())
    }

    /// One capture → infer → act iteration; a no-op unless running
    pub fn run_cycle(&mut self) -> RunnerState {
        if self.state != RunnerState::Running {
            return self.state;
        }
        self.stats.cycles += 1;

        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Capture failed: {}", e);
                self.begin_stopping(StopReason::CaptureFailed);
                return self.state;
            }
        };

        let inference = match self.detector.infer(&frame) {
            Ok(inference) => inference,
            Err(e) if e.is_fatal() => {
                error!("Inference failed: {}", e);
                self.begin_stopping(StopReason::InferenceFailed);
                return self.state;
            }
            Err(e) => {
                warn!("Skipping frame {}: {}", frame.sequence, e);
                self.stats.skipped_cycles += 1;
                if self.stop.is_stop_requested() {
                    self.begin_stopping(StopReason::UserRequested);
                }
                return self.state;
            }
        };
        debug!(
            "Frame {}: {} detections in {:?}",
            frame.sequence,
            inference.len(),
            inference.inference_time
        );

        let mut quit = false;
        if let Some(preview) = self.preview.as_mut() {
            let fps = throughput(inference.inference_time);
            match preview.render(&frame, inference.detections(), fps) {
                Ok(PreviewSignal::Quit) => quit = true,
                Ok(PreviewSignal::Continue) => {}
                Err(e) => warn!("Preview failed: {}", e),
            }
        }
        if quit || self.stop.is_stop_requested() {
            self.begin_stopping(StopReason::UserRequested);
            return self.state;
        }

        for action in self.policy.actions_for(inference.detections()) {
            match self.actuators.apply(&action) {
                Ok(()) => self.stats.actions_applied += 1,
                Err(e) => {
                    warn!("Failed to {}: {}", action, e);
                    self.stats.actuator_failures += 1;
                }
            }
        }
        self.state
    }

    /// Start, cycle until something stops the loop, then clean up
    pub fn run(&mut self) -> Result<StopReason, WhiskerError> {
        if self.state != RunnerState::Idle {
            return Err(WhiskerError::Runner(format!(
                "Cannot run a runner that is {}",
                self.state
            )));
        }
        if self.start().is_ok() {
            while self.run_cycle() == RunnerState::Running {}
        }

        self.cleanup();
        let reason = self.stop_reason.unwrap_or(StopReason::UserRequested);
        info!(
            "Detection loop ended ({:?}) after {} cycles, {} skipped, {} actions, {} actuator failures",
            reason,
            self.stats.cycles,
            self.stats.skipped_cycles,
            self.stats.actions_applied,
            self.stats.actuator_failures
        );
        Ok(reason)
    }

    /// Release preview, frame source, indicator, buzzer, in that order
    ///
    /// Every step is attempted whatever happened before it; failures are
    /// logged and never propagated. Calling it again is a no-op.
    pub fn cleanup(&mut self) {
        if self.state == RunnerState::Stopped {
            return;
        }
        if self.state != RunnerState::Stopping {
            self.begin_stopping(StopReason::UserRequested);
        }

        if let Some(preview) = self.preview.as_mut() {
            if let Err(e) = preview.release() {
                warn!("Failed to release preview: {}", e);
            }
        }
        if let Err(e) = self.source.stop() {
            warn!("Failed to stop frame source: {}", e);
        }
        if let Err(e) = self.actuators.indicator_off() {
            warn!("Failed to turn indicator off: {}", e);
        }
        if let Err(e) = self.actuators.buzzer_off() {
            warn!("Failed to turn buzzer off: {}", e);
        }

        self.state = RunnerState::Stopped;
        info!("Detection loop stopped");
    }

    fn begin_stopping(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(reason);
        }
        self.state = RunnerState::Stopping;
        debug!("Runner stopping: {:?}", reason);
    }
}

impl Drop for DetectionLoopRunner {
    fn drop(&mut self) {
        if matches!(self.state, RunnerState::Running | RunnerState::Stopping) {
            self.cleanup();
        }
    }
}
