//! On-screen preview through OpenCV highgui

use crate::preview::{PreviewRenderer, PreviewSignal};
use opencv::{
    core::{Mat, Point, Rect, Scalar, CV_8UC3},
    highgui, imgproc,
    prelude::*,
};
use std::collections::HashMap;
use tracing::{debug, info};
use whisker_core::{ClassId, Color, Detection, Frame, PreviewError};

const WINDOW_NAME: &str = "Camera";
const QUIT_KEY: i32 = 'q' as i32;
const BOX_THICKNESS: i32 = 2;

fn display_err(e: opencv::Error) -> PreviewError {
    PreviewError::Display(e.to_string())
}

fn bgr(color: Color) -> Scalar {
    Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.0)
}

/// Annotated frames in a desktop window; `q` asks the loop to stop
pub struct WindowPreview {
    names: HashMap<ClassId, String>,
    colors: HashMap<ClassId, Color>,
    open: bool,
}

impl WindowPreview {
    pub fn new(names: HashMap<ClassId, String>) -> Self {
        Self {
            names,
            colors: HashMap::new(),
            open: false,
        }
    }

    /// Box colors per class; unlisted classes are drawn green
    pub fn with_colors(mut self, colors: HashMap<ClassId, Color>) -> Self {
        self.colors = colors;
        self
    }

    fn to_mat(frame: &Frame) -> Result<Mat, PreviewError> {
        let (width, height) = (frame.width() as i32, frame.height() as i32);
        let mut rgb = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
            .map_err(display_err)?;
        rgb.data_bytes_mut()
            .map_err(display_err)?
            .copy_from_slice(frame.image.as_raw());

        let mut out = Mat::default();
        imgproc::cvt_color(&rgb, &mut out, imgproc::COLOR_RGB2BGR, 0).map_err(display_err)?;
        Ok(out)
    }

    fn draw_detection(&self, canvas: &mut Mat, detection: &Detection) -> Result<(), PreviewError> {
        let color = bgr(self.colors.get(&detection.class_id).copied().unwrap_or(Color::GREEN));
        let bbox = detection.bbox;
        let rect = Rect::new(
            bbox.x.round() as i32,
            bbox.y.round() as i32,
            bbox.width.round().max(1.0) as i32,
            bbox.height.round().max(1.0) as i32,
        );
        imgproc::rectangle(canvas, rect, color, BOX_THICKNESS, imgproc::LINE_8, 0)
            .map_err(display_err)?;

        let name = self
            .names
            .get(&detection.class_id)
            .cloned()
            .unwrap_or_else(|| detection.class_id.to_string());
        let caption = format!("{} {:.2}", name, detection.confidence);
        let origin = Point::new(rect.x, (rect.y - 6).max(12));
        imgproc::put_text(
            canvas,
            &caption,
            origin,
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            1,
            imgproc::LINE_AA,
            false,
        )
        .map_err(display_err)
    }

    /// FPS readout in the top-right corner
    fn draw_throughput(canvas: &mut Mat, fps: f32) -> Result<(), PreviewError> {
        let text = format!("FPS: {:.1}", fps);
        let font = imgproc::FONT_HERSHEY_SCRIPT_COMPLEX;
        let mut baseline = 0;
        let size = imgproc::get_text_size(&text, font, 1.0, 2, &mut baseline).map_err(display_err)?;
        let origin = Point::new(canvas.cols() - size.width - 10, size.height + 10);
        imgproc::put_text(
            canvas,
            &text,
            origin,
            font,
            1.0,
            Scalar::all(255.0),
            2,
            imgproc::LINE_AA,
            false,
        )
        .map_err(display_err)
    }
}

impl PreviewRenderer for WindowPreview {
    fn render(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
        throughput: Option<f32>,
    ) -> Result<PreviewSignal, PreviewError> {
        let mut canvas = Self::to_mat(frame)?;
        for detection in detections {
            self.draw_detection(&mut canvas, detection)?;
        }
        if let Some(fps) = throughput {
            Self::draw_throughput(&mut canvas, fps)?;
        }

        highgui::imshow(WINDOW_NAME, &canvas).map_err(display_err)?;
        if !self.open {
            info!("Preview window opened");
            self.open = true;
        }

        let key = highgui::wait_key(1).map_err(display_err)?;
        if key & 0xff == QUIT_KEY {
            debug!("Quit key pressed in preview");
            return Ok(PreviewSignal::Quit);
        }
        Ok(PreviewSignal::Continue)
    }

    fn release(&mut self) -> Result<(), PreviewError> {
        if self.open {
            highgui::destroy_all_windows().map_err(display_err)?;
            self.open = false;
            info!("Preview window closed");
        }
        Ok(())
    }
}
