//! Captured frames

use chrono::{DateTime, Utc};
use image::RgbImage;

/// One image sample from the capture device, RGB, row-major
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Monotonic per-source counter, starting at 0
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Build a frame from packed RGB bytes; `None` when the length does not match
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|image| Self::new(image, sequence))
    }
}
