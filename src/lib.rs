// THEORY:
// This file is the main entry point for the `csi_face_detect` library crate.
// It owns everything about the face-detect demo that does not need OpenCV
// linked in: the GStreamer descriptor for the CSI camera, the geometry and
// colour records, the per-frame detect-and-draw step, the capture/display
// seams, and the loop that drives them until the user quits.
//
// The OpenCV-backed binary (`camera_face_detect`) plugs concrete capture,
// display and cascade implementations into the seams exported here, so the
// whole control flow can also be driven by in-memory frames in tests.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod face_detect;
pub mod telemetry;

pub use error::{FaceDetectError, Result};
