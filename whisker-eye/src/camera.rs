//! USB / CSI camera capture through OpenCV

use crate::source::FrameSource;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use tracing::{debug, info, warn};
use whisker_core::{CameraConfig, CaptureError, Frame};

/// Camera frame source
pub struct CameraSource {
    config: CameraConfig,
    capture: Option<VideoCapture>,
    sequence: u64,
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            capture: None,
            sequence: 0,
        }
    }

    fn open(&self) -> Result<VideoCapture, CaptureError> {
        let camera_id = self.config.camera_id;
        let mut capture = VideoCapture::new(camera_id as i32, CAP_ANY)
            .map_err(|e| CaptureError::Device(format!("Failed to open camera {}: {}", camera_id, e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CaptureError::Device(format!("Camera {} not opened: {}", camera_id, e)))?;
        if !opened {
            return Err(CaptureError::Device(format!("Camera {} failed to open", camera_id)));
        }

        let (width, height) = self.config.resolution;
        let settings = [
            (CAP_PROP_FRAME_WIDTH, width as f64, "width"),
            (CAP_PROP_FRAME_HEIGHT, height as f64, "height"),
            (CAP_PROP_FPS, self.config.frame_rate as f64, "frame rate"),
        ];
        for (prop, value, name) in settings {
            // Drivers are free to ignore these; a refusal is not fatal
            match capture.set(prop, value) {
                Ok(true) => {}
                Ok(false) => warn!("Camera {} ignored {} = {}", camera_id, name, value),
                Err(e) => warn!("Failed to set camera {} {}: {}", camera_id, name, e),
            }
        }

        Ok(capture)
    }

    fn to_frame(&self, bgr: &Mat) -> Result<Frame, CaptureError> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| CaptureError::Device(format!("Failed to convert color: {}", e)))?;

        let (width, height) = (rgb.cols(), rgb.rows());
        if width <= 0 || height <= 0 {
            return Err(CaptureError::Device("Invalid frame dimensions".to_string()));
        }

        // cvt_color allocates a fresh, continuous buffer
        let data = rgb
            .data_bytes()
            .map_err(|e| CaptureError::Device(format!("Failed to read frame data: {}", e)))?
            .to_vec();

        Frame::from_rgb_bytes(width as u32, height as u32, data, self.sequence)
            .ok_or_else(|| CaptureError::Device("Frame buffer size mismatch".to_string()))
    }
}

impl FrameSource for CameraSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let capture = self.open()?;
        self.capture = Some(capture);
        info!(
            "Camera {} started at {}x{} @ {}fps",
            self.config.camera_id,
            self.config.resolution.0,
            self.config.resolution.1,
            self.config.frame_rate
        );
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        let capture = self.capture.as_mut().ok_or(CaptureError::NotStarted)?;

        let mut bgr = Mat::default();
        let grabbed = capture
            .read(&mut bgr)
            .map_err(|e| CaptureError::Disconnected(format!("Failed to read frame: {}", e)))?;
        if !grabbed || bgr.rows() <= 0 || bgr.cols() <= 0 {
            return Err(CaptureError::Disconnected(format!(
                "Camera {} returned no frame",
                self.config.camera_id
            )));
        }

        let frame = self.to_frame(&bgr)?;
        debug!("Captured frame {}", frame.sequence);
        self.sequence += 1;
        Ok(frame)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(mut capture) = self.capture.take() {
            capture
                .release()
                .map_err(|e| CaptureError::Device(format!("Failed to release camera: {}", e)))?;
            info!("Camera {} stopped", self.config.camera_id);
        }
        Ok(())
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{}", e);
        }
    }
}
