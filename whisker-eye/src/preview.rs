//! Optional annotated preview

use std::time::Duration;
use whisker_core::{Detection, Frame, PreviewError};

/// What the preview asks the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSignal {
    Continue,
    /// The user asked to stop
    Quit,
}

/// Renders a frame with its detections and reports whether to keep going
pub trait PreviewRenderer: Send {
    fn render(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
        throughput: Option<f32>,
    ) -> Result<PreviewSignal, PreviewError>;

    /// Tear down windows; idempotent
    fn release(&mut self) -> Result<(), PreviewError>;
}

/// Frames per second implied by one inference: 1000 / milliseconds
///
/// `None` for a zero duration.
pub fn throughput(inference_time: Duration) -> Option<f32> {
    let millis = inference_time.as_secs_f64() * 1000.0;
    if millis > 0.0 {
        Some((1000.0 / millis) as f32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(Duration::from_millis(100)), Some(10.0));
        assert_eq!(throughput(Duration::from_millis(40)), Some(25.0));
        let fps = throughput(Duration::from_micros(33_333)).unwrap();
        assert!((fps - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_throughput_zero_duration() {
        assert_eq!(throughput(Duration::ZERO), None);
    }
}
