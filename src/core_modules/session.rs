// THEORY:
// The `session` module describes the two long-lived resources of a run, the
// capture session and the display window, and the guarantee that they are
// torn down together.
//
// Key architectural principles:
// 1.  **Seams, not backends**: `CaptureSession` and `FrameDisplay` are the
//     shapes of OpenCV's `VideoCapture` and `highgui` calls. The loop only
//     ever talks to these traits.
// 2.  **Scoped cleanup**: once a capture session has opened, a
//     `CleanupGuard` takes both resources. Whatever ends the run (a quit key,
//     a closed window, an error bubbling up through `?`, or a panic) the
//     guard releases the capture and then destroys all windows, exactly once.
//     A session that never opened is never handed to a guard, so it is never
//     released.

use crate::error::Result;
use std::time::Duration;
use tracing::{debug, error};

/// An open (or failed-to-open) video source.
pub trait CaptureSession {
    type Frame;

    fn is_opened(&self) -> Result<bool>;

    /// Fetch the next frame. `None` means the source produced nothing.
    fn read_frame(&mut self) -> Result<Option<Self::Frame>>;

    fn release(&mut self) -> Result<()>;
}

/// A windowing backend able to show frames of type `F` and poll the keyboard.
pub trait FrameDisplay<F> {
    /// Create an auto-sized window titled `title`.
    fn create_window(&mut self, title: &str) -> Result<()>;

    /// False once the user has closed the window.
    fn is_window_visible(&self, title: &str) -> Result<bool>;

    fn show(&mut self, title: &str, frame: &F) -> Result<()>;

    /// Wait up to `delay` for a key press; returns the raw code or `-1`.
    fn poll_key(&mut self, delay: Duration) -> Result<i32>;

    fn destroy_all_windows(&mut self) -> Result<()>;
}

/// Lifecycle of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Opened,
    Running,
    Terminated,
}

/// Owns the opened capture session and display for the length of a run and
/// tears both down on every exit path.
pub struct CleanupGuard<'a, C, D>
where
    C: CaptureSession,
    D: FrameDisplay<C::Frame>,
{
    capture: &'a mut C,
    display: &'a mut D,
    closed: bool,
}

impl<'a, C, D> CleanupGuard<'a, C, D>
where
    C: CaptureSession,
    D: FrameDisplay<C::Frame>,
{
    pub fn new(capture: &'a mut C, display: &'a mut D) -> Self {
        Self {
            capture,
            display,
            closed: false,
        }
    }

    pub fn capture(&mut self) -> &mut C {
        &mut *self.capture
    }

    pub fn display(&mut self) -> &mut D {
        &mut *self.display
    }

    /// Release the capture session, then destroy all windows.
    ///
    /// Both steps are attempted even if the first fails; the first error is
    /// returned.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        debug!("releasing capture session and destroying windows");
        let released = self.capture.release();
        let destroyed = self.display.destroy_all_windows();
        released.and(destroyed)
    }
}

impl<C, D> Drop for CleanupGuard<'_, C, D>
where
    C: CaptureSession,
    D: FrameDisplay<C::Frame>,
{
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            error!(%err, "cleanup after detection loop failed");
        }
    }
}
