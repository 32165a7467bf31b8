//! Error types.
//!
//! Degraded conditions (no aspect-matching preview size, invalid rotation,
//! frames dropped while the consumer is busy) are not errors. They are
//! logged and the computation continues.

use crate::format::PreviewFormat;

/// Error returned by preview planning, the frame relay and the camera controller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PreviewError {
    /// Resolution selection was given an empty candidate list.
    #[error("no candidate resolutions supplied")]
    NoCandidates,
    /// A size that must be positive has a zero dimension.
    #[error("zero width or height")]
    ZeroDimension,
    /// The preview pixel format is not supported by the capture source.
    #[error("preview format {0:?} is not supported")]
    UnsupportedFormat(PreviewFormat),
    /// A controller operation was called in a camera state that does not allow it.
    #[error("cannot {operation} while camera is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// The capture source reported a failure.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The frame relay's consumer thread could not be started.
    #[cfg(feature = "std")]
    #[error("failed to spawn frame relay thread")]
    Spawn(#[source] std::io::Error),
}

/// Failure reported by a [`CameraBackend`](crate::camera::CameraBackend).
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("camera open failed: {0}")]
    OpenFailed(String),
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("preview failed: {0}")]
    PreviewFailed(String),
    #[error("{0} is not supported by this camera")]
    Unsupported(&'static str),
}

/// Result alias used across the crate.
pub type Result<T, E = PreviewError> = core::result::Result<T, E>;
