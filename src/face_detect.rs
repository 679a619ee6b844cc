// THEORY:
// The `face_detect` module is the top-level API of the crate: a single-threaded
// loop that pulls frames from a capture session, annotates them with face and
// eye outlines, shows them, and stops when the user asks it to.
//
// State machine:
//   Unopened -> Opened -> Running -> Terminated
//   Unopened -> Terminated            (capture never opened)
//
// Key architectural principles:
// 1.  **Open failure is an outcome, not an error**: if the capture session is
//     not open the loop prints one diagnostic and returns. No detector, window
//     or cleanup call is made, because nothing exists yet to clean up.
// 2.  **Scoped teardown**: everything after a successful open runs under a
//     `CleanupGuard`, so the session is released and the windows destroyed
//     exactly once however the run ends.
// 3.  **Two ways out**: the window disappearing, or escape / `q` from the key
//     poll. A capture that stops producing frames also ends the run.

use crate::config::FaceDetectConfig;
use crate::core_modules::detection::{ColorFrame, FaceAnnotator, ObjectDetector};
use crate::core_modules::keys;
use crate::core_modules::session::{CaptureSession, CleanupGuard, FrameDisplay, SessionState};
use crate::error::Result;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The diagnostic printed when the camera cannot be opened.
pub const UNABLE_TO_OPEN_CAMERA: &str = "Unable to open camera";

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The capture session never opened.
    OpenFailed,
    /// The display window was closed by the user.
    WindowClosed,
    /// Escape or `q` was pressed; carries the masked key code.
    QuitKey(i32),
    /// The capture session returned no frame.
    StreamEnded,
}

/// What happened during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: ExitReason,
    pub frames_processed: u64,
    pub faces_detected: u64,
    pub eyes_detected: u64,
}

impl RunSummary {
    fn new(exit: ExitReason) -> Self {
        Self {
            exit,
            frames_processed: 0,
            faces_detected: 0,
            eyes_detected: 0,
        }
    }
}

/// Drives capture, detection and display until an exit condition is met.
pub struct FaceDetectLoop<FD, ED> {
    annotator: FaceAnnotator<FD, ED>,
    window_title: String,
    key_poll_interval: Duration,
    state: SessionState,
}

impl<FD, ED> FaceDetectLoop<FD, ED> {
    pub fn new(
        annotator: FaceAnnotator<FD, ED>,
        window_title: impl Into<String>,
        key_poll_interval: Duration,
    ) -> Self {
        Self {
            annotator,
            window_title: window_title.into(),
            key_poll_interval,
            state: SessionState::Unopened,
        }
    }

    /// Build a loop from a parsed configuration and two loaded detectors.
    pub fn from_config(config: &FaceDetectConfig, face_detector: FD, eye_detector: ED) -> Self {
        let annotator = FaceAnnotator::new(face_detector, eye_detector)
            .with_params(config.face_params, config.eye_params);
        Self::new(
            annotator,
            config.window_title.clone(),
            config.key_poll_interval,
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn annotator(&self) -> &FaceAnnotator<FD, ED> {
        &self.annotator
    }

    /// Run until the window closes, a quit key is pressed, or the stream ends.
    pub fn run<C, D>(&mut self, capture: &mut C, display: &mut D) -> Result<RunSummary>
    where
        C: CaptureSession,
        C::Frame: ColorFrame,
        FD: ObjectDetector<<C::Frame as ColorFrame>::Gray>,
        ED: ObjectDetector<<C::Frame as ColorFrame>::Gray>,
        D: FrameDisplay<C::Frame>,
    {
        let span = tracing::info_span!("face_detect.run", window = %self.window_title);
        let _entered = span.enter();
        self.state = SessionState::Unopened;

        // --- 1. Capture Session ---
        if !capture.is_opened()? {
            println!("{UNABLE_TO_OPEN_CAMERA}");
            warn!("capture session did not open");
            self.state = SessionState::Terminated;
            return Ok(RunSummary::new(ExitReason::OpenFailed));
        }
        self.state = SessionState::Opened;

        // --- 2. Scoped Resources ---
        let mut guard = CleanupGuard::new(capture, display);
        let mut summary = RunSummary::new(ExitReason::StreamEnded);
        let outcome = self.drive(&mut guard, &mut summary);

        // --- 3. Teardown ---
        let closed = guard.close();
        self.state = SessionState::Terminated;
        if let Err(err) = &closed {
            error!(%err, "cleanup after detection loop failed");
        }

        summary.exit = outcome?;
        closed?;

        info!(
            exit = ?summary.exit,
            frames = summary.frames_processed,
            faces = summary.faces_detected,
            eyes = summary.eyes_detected,
            "detection loop finished"
        );
        Ok(summary)
    }

    fn drive<C, D>(
        &mut self,
        guard: &mut CleanupGuard<'_, C, D>,
        summary: &mut RunSummary,
    ) -> Result<ExitReason>
    where
        C: CaptureSession,
        C::Frame: ColorFrame,
        FD: ObjectDetector<<C::Frame as ColorFrame>::Gray>,
        ED: ObjectDetector<<C::Frame as ColorFrame>::Gray>,
        D: FrameDisplay<C::Frame>,
    {
        guard.display().create_window(&self.window_title)?;
        self.state = SessionState::Running;
        debug!("display window created");

        loop {
            // --- Frame Acquisition ---
            let Some(mut frame) = guard.capture().read_frame()? else {
                warn!(
                    frames = summary.frames_processed,
                    "capture returned no frame, ending stream"
                );
                return Ok(ExitReason::StreamEnded);
            };

            // --- Detection & Annotation ---
            let detections = self.annotator.annotate(&mut frame)?;
            summary.frames_processed += 1;
            summary.faces_detected += detections.len() as u64;
            let eyes: usize = detections.iter().map(|d| d.eyes.len()).sum();
            summary.eyes_detected += eyes as u64;
            if !detections.is_empty() {
                debug!(
                    frame = summary.frames_processed,
                    faces = detections.len(),
                    "faces detected"
                );
            }

            // --- Display ---
            // The window may have been closed from its title bar.
            if !guard.display().is_window_visible(&self.window_title)? {
                info!("display window closed");
                return Ok(ExitReason::WindowClosed);
            }
            guard.display().show(&self.window_title, &frame)?;

            // --- Keyboard ---
            let key = guard.display().poll_key(self.key_poll_interval)?;
            if keys::is_quit_key(key) {
                info!(key = keys::key_code(key), "quit key pressed");
                return Ok(ExitReason::QuitKey(keys::key_code(key)));
            }
        }
    }
}
