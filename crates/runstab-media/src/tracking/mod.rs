//! Runner tracking and treadmill-style reframing.
//!
//! A fixed camera films a runner crossing the frame. This module finds the
//! runner's horizontal path and re-centers a portrait crop on it so the
//! background scrolls past a stationary subject.
//!
//! # Architecture
//!
//! ```text
//! Video Input
//!     │
//!     ▼
//! ┌────────────────────┐
//! │    Frame Source    │ ← Sequential RGB decode
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │ Candidate Detector │ ← ROI band, downscale, person boxes
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │ Trajectory Fitting │ ← RANSAC + least squares (or manual anchors)
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │    Crop Planner    │ ← Fixed-size window, per-frame x offset
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │      Renderer      │ ← Crop, resize, encode
//! └─────────┬──────────┘
//!           │
//!           ▼
//!    Output Video
//! ```
//!
//! The manual strategy skips detection and fitting and only needs the
//! source resolution and frame count.

pub mod automatic;
pub mod config;
pub mod crop_planner;
pub mod detection_adapter;
pub mod detector;
pub mod manual;
pub mod outlier;
pub mod pipeline;
pub mod ransac;
pub mod renderer;
pub mod stats;

#[cfg(test)]
mod tests;

pub use automatic::AutomaticEstimator;
pub use config::{CropConfig, StabilizeConfig, TrackingConfig};
pub use crop_planner::CropPlanner;
pub use detection_adapter::CandidateDetector;
pub use detector::{default_person_detector, PersonBox, PersonDetector};
pub use manual::manual_trajectory;
pub use outlier::{one_per_frame, reject_outliers, RejectionConfig, RejectionOutcome};
pub use pipeline::{StabilizeReport, Stabilizer, TrackingStrategy};
pub use ransac::{ransac_line, RansacConfig, RansacOutcome};
pub use renderer::{ProgressCallback, RenderProgress, RenderReport, TrajectoryRenderer};

#[cfg(feature = "opencv")]
pub use detector::HogPersonDetector;
