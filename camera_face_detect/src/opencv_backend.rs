// THEORY:
// OpenCV implementations of the `csi_face_detect` seams:
//
// - `GstCapture`      -> `CaptureSession` over `videoio::VideoCapture` with the
//                        GStreamer backend.
// - `MatFrame`        -> `ColorFrame` over a BGR `Mat`.
// - `CascadeDetector` -> `ObjectDetector<Mat>` over `objdetect::CascadeClassifier`.
// - `HighGuiDisplay`  -> `FrameDisplay<MatFrame>` over `highgui`.
//
// Every `opencv::Error` is folded into `FaceDetectError::Backend` so the loop
// only ever sees the library's error type.

use std::path::{Path, PathBuf};
use std::time::Duration;

use csi_face_detect::core_modules::detection::{ColorFrame, DetectionParams, ObjectDetector};
use csi_face_detect::core_modules::geometry::{BgrColor, BoundingBox};
use csi_face_detect::core_modules::session::{CaptureSession, FrameDisplay};
use csi_face_detect::{FaceDetectError, Result};
use opencv::{
    core::{Mat, Point, Rect, Scalar, Size, ToInputOutputArray, Vector},
    highgui, imgproc,
    objdetect::CascadeClassifier,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{debug, warn};

fn cv(err: opencv::Error) -> FaceDetectError {
    FaceDetectError::backend(err)
}

fn to_cv_rect(rect: BoundingBox) -> Rect {
    Rect::new(rect.x, rect.y, rect.width, rect.height)
}

fn to_scalar(color: BgrColor) -> Scalar {
    Scalar::new(
        color.blue as f64,
        color.green as f64,
        color.red as f64,
        0.0,
    )
}

/// Outline `rect` on `image`, corner to corner, inclusive of `(x + w, y + h)`.
fn outline(
    image: &mut impl ToInputOutputArray,
    rect: BoundingBox,
    color: BgrColor,
    thickness: i32,
) -> Result<()> {
    let (x0, y0) = rect.top_left();
    let (x1, y1) = rect.bottom_right();
    imgproc::rectangle_points(
        image,
        Point::new(x0, y0),
        Point::new(x1, y1),
        to_scalar(color),
        thickness,
        imgproc::LINE_8,
        0,
    )
    .map_err(cv)
}

/// A decoded BGR frame.
pub struct MatFrame {
    mat: Mat,
}

impl ColorFrame for MatFrame {
    type Gray = Mat;

    fn to_gray(&self) -> Result<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(&self.mat, &mut gray, imgproc::COLOR_BGR2GRAY, 0)
            .map_err(cv)?;
        Ok(gray)
    }

    fn draw_rectangle(&mut self, rect: BoundingBox, color: BgrColor, thickness: i32) -> Result<()> {
        outline(&mut self.mat, rect, color, thickness)
    }

    fn draw_rectangle_in(
        &mut self,
        region: BoundingBox,
        rect: BoundingBox,
        color: BgrColor,
        thickness: i32,
    ) -> Result<()> {
        // The ROI shares pixels with the frame; its edges clip the outline.
        let region = to_cv_rect(region);
        let mut roi = Mat::roi_mut(&mut self.mat, region).map_err(cv)?;
        outline(&mut roi, rect, color, thickness)
    }
}

/// CSI camera opened through a GStreamer launch string.
pub struct GstCapture {
    capture: VideoCapture,
}

impl GstCapture {
    /// Open `descriptor` with the GStreamer backend.
    ///
    /// A pipeline OpenCV refuses outright yields a closed session rather than
    /// an error, so the caller reports it like any other open failure.
    pub fn open(descriptor: &str) -> Result<Self> {
        let capture = match VideoCapture::from_file(descriptor, videoio::CAP_GSTREAMER) {
            Ok(capture) => capture,
            Err(err) => {
                warn!(%err, "GStreamer backend rejected the capture pipeline");
                VideoCapture::default().map_err(cv)?
            }
        };
        Ok(Self { capture })
    }
}

impl CaptureSession for GstCapture {
    type Frame = MatFrame;

    fn is_opened(&self) -> Result<bool> {
        self.capture.is_opened().map_err(cv)
    }

    fn read_frame(&mut self) -> Result<Option<MatFrame>> {
        let mut mat = Mat::default();
        let grabbed = self.capture.read(&mut mat).map_err(cv)?;
        if !grabbed || mat.empty() {
            return Ok(None);
        }
        Ok(Some(MatFrame { mat }))
    }

    fn release(&mut self) -> Result<()> {
        self.capture.release().map_err(cv)
    }
}

/// A Haar cascade loaded from an XML model.
///
/// With `strict` off, a model that fails to load is kept as an empty detector
/// that finds nothing.
pub struct CascadeDetector {
    classifier: Option<CascadeClassifier>,
    path: PathBuf,
}

impl CascadeDetector {
    pub fn load(path: &Path, strict: bool) -> Result<Self> {
        let classifier = match path.to_str().map(CascadeClassifier::new) {
            Some(Ok(classifier)) => Some(classifier),
            Some(Err(err)) => {
                debug!(%err, path = %path.display(), "cascade classifier raised while loading");
                None
            }
            None => None,
        };
        let loaded = match &classifier {
            Some(classifier) => !classifier.empty().map_err(cv)?,
            None => false,
        };
        let classifier = if loaded { classifier } else { None };

        match classifier {
            Some(_) => debug!(path = %path.display(), "cascade loaded"),
            None if strict => {
                return Err(FaceDetectError::ModelLoad {
                    path: path.to_path_buf(),
                });
            }
            None => warn!(path = %path.display(), "cascade failed to load; it will detect nothing"),
        }

        Ok(Self {
            classifier,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObjectDetector<Mat> for CascadeDetector {
    fn detect(
        &mut self,
        gray: &Mat,
        region: Option<BoundingBox>,
        params: &DetectionParams,
    ) -> Result<Vec<BoundingBox>> {
        let Some(classifier) = self.classifier.as_mut() else {
            return Ok(Vec::new());
        };

        let mut objects = Vector::<Rect>::new();

        match region {
            Some(region) => {
                let roi = Mat::roi(gray, to_cv_rect(region)).map_err(cv)?;
                classifier
                    .detect_multi_scale(
                        &roi,
                        &mut objects,
                        params.scale_factor,
                        params.min_neighbors,
                        0,
                        Size::default(),
                        Size::default(),
                    )
                    .map_err(cv)?;
            }
            None => {
                classifier
                    .detect_multi_scale(
                        gray,
                        &mut objects,
                        params.scale_factor,
                        params.min_neighbors,
                        0,
                        Size::default(),
                        Size::default(),
                    )
                    .map_err(cv)?;
            }
        }

        Ok(objects
            .iter()
            .map(|r| BoundingBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

/// `highgui` windows and keyboard.
#[derive(Debug, Default)]
pub struct HighGuiDisplay;

impl FrameDisplay<MatFrame> for HighGuiDisplay {
    fn create_window(&mut self, title: &str) -> Result<()> {
        let flags = highgui::WINDOW_AUTOSIZE;
        highgui::named_window(title, flags).map_err(cv)
    }

    fn is_window_visible(&self, title: &str) -> Result<bool> {
        // WND_PROP_VISIBLE is unreliable under GTK; AUTOSIZE turns negative
        // once the window is gone on every backend.
        let autosize = highgui::get_window_property(title, highgui::WND_PROP_AUTOSIZE)
            .map_err(cv)?;
        Ok(autosize >= 0.0)
    }

    fn show(&mut self, title: &str, frame: &MatFrame) -> Result<()> {
        highgui::imshow(title, &frame.mat).map_err(cv)
    }

    fn poll_key(&mut self, delay: Duration) -> Result<i32> {
        // waitKey(0) would block forever.
        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX).max(1);
        highgui::wait_key(delay_ms).map_err(cv)
    }

    fn destroy_all_windows(&mut self) -> Result<()> {
        highgui::destroy_all_windows().map_err(cv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_map_field_for_field() {
        let rect = to_cv_rect(BoundingBox::new(3, 4, 50, 60));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (3, 4, 50, 60));
    }

    #[test]
    fn colours_keep_bgr_order() {
        let scalar = to_scalar(BgrColor::BLUE);
        assert_eq!(scalar[0], 255.0);
        assert_eq!(scalar[1], 0.0);
        assert_eq!(scalar[2], 0.0);
    }

    #[test]
    fn missing_model_is_fatal_when_strict() {
        let result = CascadeDetector::load(Path::new("/nonexistent/haarcascade_eye.xml"), true);
        assert!(matches!(result, Err(FaceDetectError::ModelLoad { .. })));
    }

    #[test]
    fn missing_model_detects_nothing_when_lenient() {
        let path = Path::new("/nonexistent/haarcascade_eye.xml");
        let mut detector = CascadeDetector::load(path, false).unwrap();
        let gray = Mat::default();
        let found = detector
            .detect(&gray, None, &DetectionParams::default())
            .expect("empty detector short-circuits");
        assert!(found.is_empty());
        assert_eq!(detector.path(), path);
    }
}
