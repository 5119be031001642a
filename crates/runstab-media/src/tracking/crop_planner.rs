//! Crop window computation.
//!
//! The crop keeps a fixed size and vertical offset for the whole video;
//! only its left edge follows the trajectory. Windows are clamped to the
//! frame independently per frame, so the subject drifts off-center near
//! the edges instead of the crop leaving the frame.

use tracing::debug;

use runstab_models::{CropPlan, Trajectory};

use super::config::CropConfig;
use crate::error::{MediaError, MediaResult};

/// Crop planner for a fixed source resolution.
pub struct CropPlanner {
    config: CropConfig,
    frame_width: u32,
    frame_height: u32,
}

impl CropPlanner {
    /// Create a new crop planner.
    pub fn new(config: CropConfig, frame_width: u32, frame_height: u32) -> Self {
        Self {
            config,
            frame_width,
            frame_height,
        }
    }

    /// Crop `(width, height)` for this source.
    ///
    /// Height is a fixed fraction of the source height and width follows the
    /// aspect ratio. Only when that width exceeds the source is the width
    /// capped and the height recomputed from it.
    pub fn crop_size(&self) -> (u32, u32) {
        let aspect = self.config.aspect;
        let (aw, ah) = (aspect.width.max(1) as u64, aspect.height.max(1) as u64);

        let mut crop_h = (self.frame_height as f64 * self.config.crop_height_ratio).floor() as u64;
        let mut crop_w = crop_h * aw / ah;

        if crop_w > self.frame_width as u64 {
            crop_w = self.frame_width as u64;
            crop_h = crop_w * ah / aw;
        }

        let crop_w = crop_w.clamp(1, self.frame_width.max(1) as u64) as u32;
        let crop_h = crop_h.clamp(1, self.frame_height.max(1) as u64) as u32;
        (crop_w, crop_h)
    }

    /// Plan one crop window per trajectory frame.
    pub fn plan(&self, trajectory: &Trajectory) -> MediaResult<CropPlan> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(MediaError::InvalidVideo(format!(
                "cannot crop a {}x{} frame",
                self.frame_width, self.frame_height
            )));
        }

        let (width, height) = self.crop_size();

        let max_y = (self.frame_height - height) as i64;
        let y = (trajectory.y_center().floor() as i64 - (height / 2) as i64).clamp(0, max_y) as u32;

        let max_x = (self.frame_width - width) as i64;
        let half_w = (width / 2) as i64;
        let xs = trajectory
            .xs()
            .iter()
            .map(|x| (x.floor() as i64 - half_w).clamp(0, max_x) as u32)
            .collect();

        debug!(
            "Crop plan: {}x{} at y={} from {}x{} source",
            width, height, y, self.frame_width, self.frame_height
        );

        Ok(CropPlan {
            width,
            height,
            y,
            xs,
        })
    }
}
