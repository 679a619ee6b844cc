//! Configuration parsing for the face-detect demo.
//!
//! This module owns translation of CLI flags (and their `FACE_DETECT_*`
//! environment fallbacks) into a `FaceDetectConfig` the loop and the OpenCV
//! backend use without re-parsing anything.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::core_modules::detection::DetectionParams;
use crate::core_modules::gstreamer::PipelineConfig;

pub const DEFAULT_FACE_CASCADE: &str =
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml";
pub const DEFAULT_EYE_CASCADE: &str = "/usr/share/opencv4/haarcascades/haarcascade_eye.xml";
pub const DEFAULT_WINDOW_TITLE: &str = "Face Detect";
pub const DEFAULT_KEY_POLL_MS: u64 = 10;

#[derive(Clone, Debug, PartialEq)]
/// Canonical configuration for one run of the demo.
pub struct FaceDetectConfig {
    /// GStreamer capture parameters.
    pub pipeline: PipelineConfig,
    /// Haar cascade used for frontal faces.
    pub face_cascade: PathBuf,
    /// Haar cascade used for eyes inside a face.
    pub eye_cascade: PathBuf,
    pub window_title: String,
    pub face_params: DetectionParams,
    pub eye_params: DetectionParams,
    /// How long each iteration waits for a key press.
    pub key_poll_interval: Duration,
    /// Abort at startup when a cascade fails to load. When false, a missing
    /// model yields no detections instead.
    pub strict_models: bool,
    pub verbose: bool,
}

impl Default for FaceDetectConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            face_cascade: PathBuf::from(DEFAULT_FACE_CASCADE),
            eye_cascade: PathBuf::from(DEFAULT_EYE_CASCADE),
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            face_params: DetectionParams::FACE,
            eye_params: DetectionParams::default(),
            key_poll_interval: Duration::from_millis(DEFAULT_KEY_POLL_MS),
            strict_models: true,
            verbose: false,
        }
    }
}

/// Command line accepted by the `face_detect` binary.
#[derive(Debug, Parser)]
#[command(
    name = "face_detect",
    about = "Haar-cascade face and eye detection on a CSI camera"
)]
pub struct FaceDetectArgs {
    /// Sensor capture width in pixels.
    #[arg(
        long,
        env = "FACE_DETECT_CAPTURE_WIDTH",
        default_value_t = 1920,
        allow_negative_numbers = true
    )]
    pub capture_width: i32,
    /// Sensor capture height in pixels.
    #[arg(
        long,
        env = "FACE_DETECT_CAPTURE_HEIGHT",
        default_value_t = 1080,
        allow_negative_numbers = true
    )]
    pub capture_height: i32,
    /// Width of the frames shown in the window.
    #[arg(
        long,
        env = "FACE_DETECT_DISPLAY_WIDTH",
        default_value_t = 960,
        allow_negative_numbers = true
    )]
    pub display_width: i32,
    /// Height of the frames shown in the window.
    #[arg(
        long,
        env = "FACE_DETECT_DISPLAY_HEIGHT",
        default_value_t = 540,
        allow_negative_numbers = true
    )]
    pub display_height: i32,
    /// Capture framerate.
    #[arg(
        long,
        env = "FACE_DETECT_FRAMERATE",
        default_value_t = 30,
        allow_negative_numbers = true
    )]
    pub framerate: i32,
    /// nvvidconv flip-method (0 none, 2 rotate 180, ...).
    #[arg(
        long,
        env = "FACE_DETECT_FLIP_METHOD",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub flip_method: i32,

    /// Frontal face Haar cascade.
    #[arg(
        long,
        env = "FACE_DETECT_FACE_CASCADE",
        value_name = "PATH",
        default_value = DEFAULT_FACE_CASCADE
    )]
    pub face_cascade: PathBuf,
    /// Eye Haar cascade.
    #[arg(
        long,
        env = "FACE_DETECT_EYE_CASCADE",
        value_name = "PATH",
        default_value = DEFAULT_EYE_CASCADE
    )]
    pub eye_cascade: PathBuf,
    /// Keep running with no detections when a cascade cannot be loaded.
    #[arg(long, env = "FACE_DETECT_ALLOW_MISSING_MODELS")]
    pub allow_missing_models: bool,

    /// Pyramid scale step for face detection.
    #[arg(long, default_value_t = 1.3)]
    pub face_scale_factor: f64,
    /// Neighbour threshold for face detection.
    #[arg(long, default_value_t = 5)]
    pub face_min_neighbors: i32,
    /// Pyramid scale step for eye detection.
    #[arg(long, default_value_t = 1.1)]
    pub eye_scale_factor: f64,
    /// Neighbour threshold for eye detection.
    #[arg(long, default_value_t = 3)]
    pub eye_min_neighbors: i32,

    /// Title of the display window.
    #[arg(
        long,
        env = "FACE_DETECT_WINDOW_TITLE",
        default_value = DEFAULT_WINDOW_TITLE
    )]
    pub window_title: String,
    /// Milliseconds to wait for a key press on each frame.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_KEY_POLL_MS)]
    pub key_poll_ms: u64,
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<FaceDetectArgs> for FaceDetectConfig {
    fn from(args: FaceDetectArgs) -> Self {
        Self {
            pipeline: PipelineConfig {
                capture_width: args.capture_width,
                capture_height: args.capture_height,
                display_width: args.display_width,
                display_height: args.display_height,
                framerate: args.framerate,
                flip_method: args.flip_method,
            },
            face_cascade: args.face_cascade,
            eye_cascade: args.eye_cascade,
            window_title: args.window_title,
            face_params: DetectionParams {
                scale_factor: args.face_scale_factor,
                min_neighbors: args.face_min_neighbors,
            },
            eye_params: DetectionParams {
                scale_factor: args.eye_scale_factor,
                min_neighbors: args.eye_min_neighbors,
            },
            key_poll_interval: Duration::from_millis(args.key_poll_ms),
            strict_models: !args.allow_missing_models,
            verbose: args.verbose,
        }
    }
}
