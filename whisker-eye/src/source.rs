//! Capture device abstraction

use whisker_core::{CaptureError, Frame};

/// Produces frames on demand
///
/// `start` and `stop` are idempotent, and `stop` is safe when `start` was
/// never called. `capture_frame` blocks until a frame is available.
pub trait FrameSource: Send {
    fn start(&mut self) -> Result<(), CaptureError>;

    fn capture_frame(&mut self) -> Result<Frame, CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;
}
