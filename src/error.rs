//! Error types for the face-detect pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for face-detect operations.
pub type Result<T> = std::result::Result<T, FaceDetectError>;

/// Errors surfaced by the capture, detection and display stages.
#[derive(Debug, Error)]
pub enum FaceDetectError {
    #[error("failed to load cascade model from {}", path.display())]
    ModelLoad { path: PathBuf },

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("detection failed: {0}")]
    Detection(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl FaceDetectError {
    /// Wrap any backend error (e.g. an OpenCV exception) as a `Backend` error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_load_message_names_the_path() {
        let err = FaceDetectError::ModelLoad {
            path: PathBuf::from("/tmp/haarcascade_eye.xml"),
        };
        assert_eq!(
            err.to_string(),
            "failed to load cascade model from /tmp/haarcascade_eye.xml"
        );
    }

    #[test]
    fn backend_errors_are_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "pipeline stalled");
        let err = FaceDetectError::backend(io);
        assert_eq!(err.to_string(), "pipeline stalled");
    }
}
