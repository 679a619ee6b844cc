mod opencv_backend;

use anyhow::{Context, Result};
use clap::Parser;
use csi_face_detect::config::{FaceDetectArgs, FaceDetectConfig};
use csi_face_detect::face_detect::FaceDetectLoop;
use csi_face_detect::telemetry;
use opencv_backend::{CascadeDetector, GstCapture, HighGuiDisplay};
use tracing::info;

fn main() -> Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let config = FaceDetectConfig::from(FaceDetectArgs::parse());
    telemetry::init_tracing(config.verbose);

    // --- 2. Cascade Models ---
    // Blue boxes are faces, green boxes are eyes.
    let face_cascade = CascadeDetector::load(&config.face_cascade, config.strict_models)
        .context("loading the frontal face cascade")?;
    let eye_cascade = CascadeDetector::load(&config.eye_cascade, config.strict_models)
        .context("loading the eye cascade")?;
    info!(
        face = %face_cascade.path().display(),
        eye = %eye_cascade.path().display(),
        "cascades ready"
    );

    // --- 3. Capture Session ---
    let descriptor = config.pipeline.to_descriptor();
    info!(%descriptor, "opening CSI camera");
    let mut capture = GstCapture::open(&descriptor)?;
    let mut display = HighGuiDisplay;

    // --- 4. Detection Loop ---
    let mut detect_loop = FaceDetectLoop::from_config(&config, face_cascade, eye_cascade);
    detect_loop.run(&mut capture, &mut display)?;

    Ok(())
}
