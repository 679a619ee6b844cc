// THEORY:
// The `gstreamer` module builds the launch string handed to OpenCV's GStreamer
// capture backend for a Jetson CSI camera. The chain is fixed:
//
//   nvarguscamerasrc -> NVMM caps (capture size, framerate)
//   -> nvvidconv (flip, scale to display size, BGRx)
//   -> videoconvert -> BGR caps -> appsink drop=True
//
// `appsink drop=True` makes the sink discard frames the consumer did not pull
// in time, so a slow detection loop always sees the freshest frame instead of
// falling behind a queue. Values are substituted verbatim; nothing is checked
// here and a bad number is left for GStreamer to reject when it parses the
// string.

use std::fmt;

/// Capture and display parameters for the CSI camera pipeline.
///
/// `flip_method` is the `nvvidconv` code: 0 none, 1 counter-clockwise,
/// 2 rotate 180, 3 clockwise, 4 horizontal flip, 5 upper-right diagonal,
/// 6 vertical flip, 7 upper-left diagonal. 0 and 2 are the common ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub capture_width: i32,
    pub capture_height: i32,
    /// Size of the frames delivered to the application (and the window).
    pub display_width: i32,
    pub display_height: i32,
    pub framerate: i32,
    pub flip_method: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture_width: 1920,
            capture_height: 1080,
            display_width: 960,
            display_height: 540,
            framerate: 30,
            flip_method: 0,
        }
    }
}

impl PipelineConfig {
    /// Render the GStreamer launch string for this configuration.
    pub fn to_descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nvarguscamerasrc ! \
             video/x-raw(memory:NVMM), \
             width=(int){}, height=(int){}, framerate=(fraction){}/1 ! \
             nvvidconv flip-method={} ! \
             video/x-raw, width=(int){}, height=(int){}, format=(string)BGRx ! \
             videoconvert ! \
             video/x-raw, format=(string)BGR ! appsink drop=True",
            self.capture_width,
            self.capture_height,
            self.framerate,
            self.flip_method,
            self.display_width,
            self.display_height,
        )
    }
}

/// Returns a GStreamer pipeline for capturing from the CSI camera.
pub fn gstreamer_pipeline(config: &PipelineConfig) -> String {
    config.to_descriptor()
}
