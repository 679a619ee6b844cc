// THEORY:
// The `detection` module is the per-frame step of the face-detect loop. It is
// stateless across frames: every frame is converted to grayscale, searched for
// faces, and each face region is then searched for eyes. Nothing is tracked
// and nothing is sorted; detections are drawn in the order the detector
// returned them.
//
// Two seams keep the step independent of OpenCV:
// 1.  `ColorFrame` is anything that can produce a grayscale copy of itself and
//     have rectangle outlines drawn on it, either on the whole frame or inside
//     a sub-region whose edges clip the outline.
// 2.  `ObjectDetector` is a pretrained detector (a Haar cascade in production)
//     that can search a whole grayscale image or a sub-region of it. Boxes
//     found in a sub-region are relative to that region's top-left corner.
//
// `FaceAnnotator` composes the two: blue outlines for faces on the frame, green
// outlines for eyes drawn inside the colour face region they were found in.

use crate::core_modules::geometry::{BgrColor, BoundingBox};
use crate::error::Result;
use tracing::trace;

/// Outline colour for face detections.
pub const FACE_COLOR: BgrColor = BgrColor::BLUE;
/// Outline colour for eye detections.
pub const EYE_COLOR: BgrColor = BgrColor::GREEN;
/// Outline thickness, in pixels, for both kinds of detection.
pub const OUTLINE_THICKNESS: i32 = 2;

/// A colour frame that the annotator can read and draw on.
pub trait ColorFrame {
    /// Single-channel image handed to the detectors.
    type Gray;

    fn to_gray(&self) -> Result<Self::Gray>;

    /// Draw the outline of `rect` (frame coordinates).
    fn draw_rectangle(&mut self, rect: BoundingBox, color: BgrColor, thickness: i32) -> Result<()>;

    /// Draw the outline of `rect`, given relative to `region`'s origin, onto
    /// the `region` view of the frame. Nothing lands outside `region`.
    fn draw_rectangle_in(
        &mut self,
        region: BoundingBox,
        rect: BoundingBox,
        color: BgrColor,
        thickness: i32,
    ) -> Result<()>;
}

/// A pretrained multi-scale object detector.
pub trait ObjectDetector<G> {
    /// Detect objects in `gray`, or only inside `region` when given.
    ///
    /// Boxes found inside a region are relative to the region's origin.
    fn detect(
        &mut self,
        gray: &G,
        region: Option<BoundingBox>,
        params: &DetectionParams,
    ) -> Result<Vec<BoundingBox>>;
}

/// Tuning knobs of a cascade detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Image pyramid step between scales.
    pub scale_factor: f64,
    /// Overlapping candidates required before a detection is kept.
    pub min_neighbors: i32,
}

impl DetectionParams {
    /// Face search parameters.
    pub const FACE: Self = Self {
        scale_factor: 1.3,
        min_neighbors: 5,
    };
}

/// The OpenCV `detectMultiScale` defaults, used for eyes.
impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
        }
    }
}

/// One detected face and the eyes found inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceDetection {
    /// Face bounds in frame coordinates.
    pub face: BoundingBox,
    /// Eye bounds relative to the face's top-left corner.
    pub eyes: Vec<BoundingBox>,
}

/// Runs face then eye detection on a frame and outlines the results.
pub struct FaceAnnotator<FD, ED> {
    face_detector: FD,
    eye_detector: ED,
    face_params: DetectionParams,
    eye_params: DetectionParams,
}

impl<FD, ED> FaceAnnotator<FD, ED> {
    pub fn new(face_detector: FD, eye_detector: ED) -> Self {
        Self {
            face_detector,
            eye_detector,
            face_params: DetectionParams::FACE,
            eye_params: DetectionParams::default(),
        }
    }

    pub fn with_params(
        mut self,
        face_params: DetectionParams,
        eye_params: DetectionParams,
    ) -> Self {
        self.face_params = face_params;
        self.eye_params = eye_params;
        self
    }

    pub fn face_detector(&self) -> &FD {
        &self.face_detector
    }

    pub fn eye_detector(&self) -> &ED {
        &self.eye_detector
    }

    /// Detect faces and eyes in `frame` and draw their outlines onto it.
    pub fn annotate<F>(&mut self, frame: &mut F) -> Result<Vec<FaceDetection>>
    where
        F: ColorFrame,
        FD: ObjectDetector<F::Gray>,
        ED: ObjectDetector<F::Gray>,
    {
        let (face_params, eye_params) = (self.face_params, self.eye_params);
        let gray = frame.to_gray()?;
        let faces = self.face_detector.detect(&gray, None, &face_params)?;

        let mut detections = Vec::with_capacity(faces.len());
        for face in faces {
            frame.draw_rectangle(face, FACE_COLOR, OUTLINE_THICKNESS)?;

            let eyes = self.eye_detector.detect(&gray, Some(face), &eye_params)?;
            for &eye in &eyes {
                frame.draw_rectangle_in(face, eye, EYE_COLOR, OUTLINE_THICKNESS)?;
            }

            trace!(?face, eyes = eyes.len(), "face annotated");
            detections.push(FaceDetection { face, eyes });
        }

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every outline drawn on it, with the region it was clipped to.
    #[derive(Default)]
    struct RecordingFrame {
        outlines: Vec<(Option<BoundingBox>, BoundingBox, BgrColor)>,
    }

    impl ColorFrame for RecordingFrame {
        type Gray = ();

        fn to_gray(&self) -> Result<()> {
            Ok(())
        }

        fn draw_rectangle(
            &mut self,
            rect: BoundingBox,
            color: BgrColor,
            thickness: i32,
        ) -> Result<()> {
            assert_eq!(thickness, OUTLINE_THICKNESS);
            self.outlines.push((None, rect, color));
            Ok(())
        }

        fn draw_rectangle_in(
            &mut self,
            region: BoundingBox,
            rect: BoundingBox,
            color: BgrColor,
            thickness: i32,
        ) -> Result<()> {
            assert_eq!(thickness, OUTLINE_THICKNESS);
            self.outlines.push((Some(region), rect, color));
            Ok(())
        }
    }

    /// Returns the same boxes on every call and logs what it was asked.
    struct FixedDetector {
        boxes: Vec<BoundingBox>,
        calls: Vec<(Option<BoundingBox>, DetectionParams)>,
    }

    impl FixedDetector {
        fn new(boxes: Vec<BoundingBox>) -> Self {
            Self {
                boxes,
                calls: Vec::new(),
            }
        }
    }

    impl ObjectDetector<()> for FixedDetector {
        fn detect(
            &mut self,
            _gray: &(),
            region: Option<BoundingBox>,
            params: &DetectionParams,
        ) -> Result<Vec<BoundingBox>> {
            self.calls.push((region, *params));
            Ok(self.boxes.clone())
        }
    }

    fn fixed_annotator(
        faces: Vec<BoundingBox>,
        eyes: Vec<BoundingBox>,
    ) -> FaceAnnotator<FixedDetector, FixedDetector> {
        FaceAnnotator::new(FixedDetector::new(faces), FixedDetector::new(eyes))
    }

    #[test]
    fn no_faces_draws_nothing_and_skips_eyes() {
        let mut annotator = fixed_annotator(vec![], vec![]);
        let mut frame = RecordingFrame::default();

        let detections = annotator.annotate(&mut frame).unwrap();

        assert!(detections.is_empty());
        assert!(frame.outlines.is_empty());
        assert_eq!(annotator.face_detector().calls.len(), 1);
        assert!(annotator.eye_detector().calls.is_empty());
    }

    #[test]
    fn eyes_are_drawn_inside_their_face() {
        let face = BoundingBox::new(100, 50, 80, 80);
        let eye = BoundingBox::new(10, 20, 15, 10);
        let mut annotator = fixed_annotator(vec![face], vec![eye]);
        let mut frame = RecordingFrame::default();

        let detections = annotator.annotate(&mut frame).unwrap();

        assert_eq!(
            detections,
            vec![FaceDetection {
                face,
                eyes: vec![eye],
            }]
        );
        assert_eq!(
            frame.outlines,
            vec![(None, face, FACE_COLOR), (Some(face), eye, EYE_COLOR)]
        );
        assert_eq!(
            annotator.eye_detector().calls,
            vec![(Some(face), DetectionParams::default())]
        );
    }

    #[test]
    fn faces_keep_detector_order() {
        let faces = vec![
            BoundingBox::new(300, 10, 40, 40),
            BoundingBox::new(0, 0, 40, 40),
            BoundingBox::new(150, 200, 40, 40),
        ];
        let mut annotator = fixed_annotator(faces.clone(), vec![]);
        let mut frame = RecordingFrame::default();

        let detections = annotator.annotate(&mut frame).unwrap();

        let drawn: Vec<_> = frame.outlines.iter().map(|(_, rect, _)| *rect).collect();
        assert_eq!(drawn, faces);
        let found: Vec<_> = detections.iter().map(|d| d.face).collect();
        assert_eq!(found, faces);
        let searched: Vec<_> = annotator
            .eye_detector()
            .calls
            .iter()
            .map(|(region, _)| *region)
            .collect();
        assert_eq!(searched, faces.into_iter().map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn face_search_uses_face_params() {
        let mut annotator = fixed_annotator(vec![], vec![]);
        annotator.annotate(&mut RecordingFrame::default()).unwrap();

        let (region, params) = annotator.face_detector().calls[0];
        assert_eq!(region, None);
        assert_eq!(params.scale_factor, 1.3);
        assert_eq!(params.min_neighbors, 5);
    }

    #[test]
    fn custom_params_are_forwarded() {
        let face_params = DetectionParams {
            scale_factor: 1.2,
            min_neighbors: 4,
        };
        let eye_params = DetectionParams {
            scale_factor: 1.05,
            min_neighbors: 6,
        };
        let face = BoundingBox::new(0, 0, 60, 60);
        let detectors = fixed_annotator(vec![face], vec![]);
        let mut annotator = detectors.with_params(face_params, eye_params);

        annotator.annotate(&mut RecordingFrame::default()).unwrap();

        assert_eq!(annotator.face_detector().calls[0].1, face_params);
        assert_eq!(annotator.eye_detector().calls[0].1, eye_params);
    }
}
