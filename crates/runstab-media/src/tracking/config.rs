//! Configuration for the runner tracking pipeline.

use serde::{Deserialize, Serialize};

use runstab_models::encoding::{PORTRAIT_HEIGHT, PORTRAIT_WIDTH};
use runstab_models::{AspectRatio, EncodingConfig};

use crate::error::{MediaError, MediaResult};

/// Detection and trajectory fitting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    // === Detection ===
    /// Top of the searched band as a fraction of frame height (default: 0.25)
    pub roi_top: f64,

    /// Bottom of the searched band as a fraction of frame height (default: 0.80)
    pub roi_bottom: f64,

    /// Downscale applied to the band before detection (default: 0.5)
    pub detection_scale: f64,

    // === Trajectory Fit ===
    /// Below this many detections the trajectory falls back to frame center (default: 4)
    pub min_detections: usize,

    /// RANSAC trial count (default: 500)
    pub ransac_trials: usize,

    /// RANSAC inlier distance in pixels (default: 80.0)
    pub inlier_threshold: f64,

    /// Seed for RANSAC sampling (default: 42)
    pub seed: u64,

    // === Secondary Rejection ===
    /// Run median-residual rejection after RANSAC (default: true)
    pub secondary_rejection: bool,

    /// Median residual multiplier (default: 3.0)
    pub rejection_multiplier: f64,

    /// Pixels added to the scaled median residual (default: 10.0)
    pub rejection_offset: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            // Skip sky and ground
            roi_top: 0.25,
            roi_bottom: 0.80,
            detection_scale: 0.5,

            min_detections: 4,
            ransac_trials: 500,
            inlier_threshold: 80.0,
            seed: 42,

            secondary_rejection: true,
            rejection_multiplier: 3.0,
            rejection_offset: 10.0,
        }
    }
}

/// Crop geometry and output size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    /// Crop height as a fraction of source height (default: 0.15)
    pub crop_height_ratio: f64,

    /// Crop aspect ratio (default: 9:16)
    pub aspect: AspectRatio,

    /// Output width (default: 1080)
    pub output_width: u32,

    /// Output height (default: 1920)
    pub output_height: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            crop_height_ratio: 0.15,
            aspect: AspectRatio::PORTRAIT,
            output_width: PORTRAIT_WIDTH,
            output_height: PORTRAIT_HEIGHT,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilizeConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub crop: CropConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    /// Keep decoded frames from the detection pass for rendering
    /// instead of decoding the input twice (default: false)
    #[serde(default)]
    pub cache_frames: bool,
}

impl StabilizeConfig {
    /// Fast configuration for quick previews.
    pub fn preview() -> Self {
        Self {
            crop: CropConfig {
                output_width: 540,
                output_height: 960,
                ..Default::default()
            },
            encoding: EncodingConfig {
                preset: "ultrafast".to_string(),
                crf: 26,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> MediaResult<()> {
        let t = &self.tracking;
        if !(0.0..1.0).contains(&t.roi_top) || !(t.roi_top < t.roi_bottom && t.roi_bottom <= 1.0) {
            return Err(MediaError::invalid_config(format!(
                "detection band {}..{} must satisfy 0 <= top < bottom <= 1",
                t.roi_top, t.roi_bottom
            )));
        }
        if !(t.detection_scale > 0.0 && t.detection_scale <= 1.0) {
            return Err(MediaError::invalid_config(format!(
                "detection scale {} must be in (0, 1]",
                t.detection_scale
            )));
        }
        if t.ransac_trials == 0 {
            return Err(MediaError::invalid_config("RANSAC needs at least one trial"));
        }
        if !(t.inlier_threshold > 0.0) {
            return Err(MediaError::invalid_config("inlier threshold must be positive"));
        }
        if t.rejection_multiplier < 0.0 || t.rejection_offset < 0.0 {
            return Err(MediaError::invalid_config(
                "rejection multiplier and offset must not be negative",
            ));
        }

        let c = &self.crop;
        if !(c.crop_height_ratio > 0.0 && c.crop_height_ratio <= 1.0) {
            return Err(MediaError::invalid_config(format!(
                "crop height ratio {} must be in (0, 1]",
                c.crop_height_ratio
            )));
        }
        AspectRatio::new(c.aspect.width, c.aspect.height)?;
        if c.output_width == 0 || c.output_height == 0 {
            return Err(MediaError::invalid_config("output size must be non-zero"));
        }

        Ok(())
    }
}
