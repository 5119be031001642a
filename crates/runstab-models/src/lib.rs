//! Shared data models for the RunStab pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Pixel geometry and aspect ratios
//! - Per-frame person detections
//! - Fitted and manual trajectories
//! - Crop plans
//! - Encoding configuration

pub mod crop;
pub mod detection;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod trajectory;

// Re-export common types
pub use crop::{CropPlan, CropWindow};
pub use detection::{flatten_detections, Detection, FrameDetections};
pub use encoding::EncodingConfig;
pub use error::{ModelError, ModelResult};
pub use geometry::{AspectRatio, BoundingBox};
pub use trajectory::{LinearFit, ManualAnchors, Trajectory, TrajectorySource};
