//! Validation errors for model construction.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or validating models.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid manual anchors: {0}")]
    InvalidAnchors(String),

    #[error("Trajectory must cover at least one frame")]
    EmptyTrajectory,

    #[error("Invalid aspect ratio {width}:{height}")]
    InvalidAspectRatio { width: u32, height: u32 },
}
