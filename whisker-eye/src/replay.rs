//! Frames replayed from a directory of still images

use crate::source::FrameSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use whisker_core::{CaptureError, Frame};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Serves the images of a directory in file-name order
///
/// Without looping, the source reports [`CaptureError::Exhausted`] after the
/// last image, which ends the run the same way a camera disconnect does.
pub struct ReplaySource {
    dir: PathBuf,
    looping: bool,
    files: Vec<PathBuf>,
    next: usize,
    sequence: u64,
    started: bool,
}

impl ReplaySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            looping: false,
            files: Vec::new(),
            next: 0,
            sequence: 0,
            started: false,
        }
    }

    /// Restart from the first image instead of ending
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::Device(format!("Failed to read {:?}: {}", dir, e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl FrameSource for ReplaySource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.started {
            return Ok(());
        }

        let files = Self::list_images(&self.dir)?;
        if files.is_empty() {
            return Err(CaptureError::Device(format!("No images found in {:?}", self.dir)));
        }

        info!("Replaying {} images from {:?}", files.len(), self.dir);
        self.files = files;
        self.next = 0;
        self.started = true;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }

        if self.next >= self.files.len() {
            if !self.looping {
                return Err(CaptureError::Exhausted);
            }
            self.next = 0;
        }

        let path = &self.files[self.next];
        self.next += 1;
        let image = image::open(path)
            .map_err(|e| CaptureError::Device(format!("Failed to decode {:?}: {}", path, e)))?
            .to_rgb8();
        debug!("Replayed {:?}", path);

        let frame = Frame::new(image, self.sequence);
        self.sequence += 1;
        Ok(frame)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if self.started {
            info!("Replay source stopped");
        }
        self.started = false;
        self.files.clear();
        self.next = 0;
        Ok(())
    }
}
