//! Automatic trajectory estimation from detector output.
//!
//! 1. Too few detections: constant trajectory at frame center
//! 2. RANSAC over all detections for the best-supported line
//! 3. Least-squares refit on the RANSAC inliers
//! 4. Optional median-residual rejection on one inlier per frame (x fit only;
//!    the vertical center stays the median of all inlier y values)
//! 5. Densify to every frame, clipped to the frame width

use std::collections::BTreeSet;

use tracing::{info, warn};

use runstab_models::{Detection, Trajectory, TrajectorySource};

use super::config::TrackingConfig;
use super::outlier::{one_per_frame, reject_outliers, RejectionConfig};
use super::ransac::{ransac_line, RansacConfig, RansacOutcome};
use super::stats::{least_squares, median};
use crate::error::{MediaError, MediaResult};

fn distinct_frames(detections: &[Detection]) -> usize {
    detections.iter().map(|d| d.frame).collect::<BTreeSet<_>>().len()
}

/// Robust linear trajectory estimator.
#[derive(Debug, Clone)]
pub struct AutomaticEstimator {
    config: TrackingConfig,
}

impl AutomaticEstimator {
    /// Create an estimator.
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn ransac_config(&self) -> RansacConfig {
        RansacConfig {
            trials: self.config.ransac_trials,
            inlier_threshold: self.config.inlier_threshold,
            seed: self.config.seed,
        }
    }

    fn rejection_config(&self) -> RejectionConfig {
        RejectionConfig {
            multiplier: self.config.rejection_multiplier,
            offset: self.config.rejection_offset,
        }
    }

    /// Estimate a trajectory covering `frame_count` frames of a
    /// `width x height` video.
    pub fn estimate(
        &self,
        detections: &[Detection],
        frame_count: usize,
        width: u32,
        height: u32,
    ) -> MediaResult<Trajectory> {
        if frame_count == 0 {
            return Err(MediaError::InvalidVideo("no frames to track".to_string()));
        }

        if detections.len() < self.config.min_detections {
            warn!(
                "Only {} detection(s) (need {}), using frame center",
                detections.len(),
                self.config.min_detections
            );
            let xs = vec![(width / 2) as f64; frame_count];
            return Ok(Trajectory::new(
                xs,
                (height / 2) as f64,
                TrajectorySource::CenterFallback {
                    detections: detections.len(),
                },
            )?);
        }

        let consensus = match ransac_line(detections, &self.ransac_config()) {
            Some(consensus) => consensus,
            None => {
                let usable = distinct_frames(detections);
                if usable < 2 {
                    return Err(MediaError::InsufficientDetections { usable });
                }
                // Every sampled pair shared a frame; fit everything instead.
                let points: Vec<(f64, f64)> =
                    detections.iter().map(|d| (d.frame as f64, d.x)).collect();
                let model = least_squares(&points)
                    .ok_or(MediaError::InsufficientDetections { usable })?;
                warn!(
                    "RANSAC found no model over {} frames, fitting all {} detections",
                    usable,
                    detections.len()
                );
                RansacOutcome {
                    model,
                    inliers: detections.to_vec(),
                }
            }
        };

        let points: Vec<(f64, f64)> = consensus
            .inliers
            .iter()
            .map(|d| (d.frame as f64, d.x))
            .collect();
        let mut fit = least_squares(&points).ok_or_else(|| MediaError::InsufficientDetections {
            usable: distinct_frames(&consensus.inliers),
        })?;
        let ys: Vec<f64> = consensus.inliers.iter().map(|d| d.y).collect();
        let y_center = median(&ys);

        info!(
            "RANSAC: {} ({}/{} inliers)",
            fit,
            consensus.support(),
            detections.len()
        );

        let mut kept_after_rejection = None;
        if self.config.secondary_rejection {
            let per_frame = one_per_frame(&consensus.inliers, &consensus.model);
            match reject_outliers(&per_frame, &self.rejection_config()) {
                Some(outcome) => {
                    info!(
                        "Outlier rejection: {} ({}/{} points, cutoff {:.1}px)",
                        outcome.fit,
                        outcome.kept.len(),
                        per_frame.len(),
                        outcome.threshold
                    );
                    fit = outcome.fit;
                    kept_after_rejection = Some(outcome.kept.len());
                }
                None => warn!("Outlier rejection was degenerate, keeping inlier fit"),
            }
        }

        let max_x = width.saturating_sub(1) as f64;
        let xs = (0..frame_count)
            .map(|f| fit.at(f as f64).clamp(0.0, max_x))
            .collect();

        Ok(Trajectory::new(
            xs,
            y_center,
            TrajectorySource::Fitted {
                fit,
                inliers: consensus.support(),
                kept_after_rejection,
                detections: detections.len(),
            },
        )?)
    }
}
