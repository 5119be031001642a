//! Median-residual outlier rejection.
//!
//! Works on one detection per frame: fit a provisional line, drop points
//! whose residual reaches `median * multiplier + offset`, and refit on the
//! rest. Usable on its own or after RANSAC.

use std::collections::BTreeMap;

use runstab_models::{Detection, LinearFit};

use super::stats::{least_squares, median};

/// Rejection threshold parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectionConfig {
    pub multiplier: f64,
    pub offset: f64,
}

impl Default for RejectionConfig {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            offset: 10.0,
        }
    }
}

/// Result of a rejection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectionOutcome {
    /// Least-squares fit over the surviving points
    pub fit: LinearFit,
    /// Surviving points in input order
    pub kept: Vec<Detection>,
    /// Residual cutoff that was applied
    pub threshold: f64,
    /// Median y of the surviving points
    pub y_center: f64,
}

fn points_of(detections: &[Detection]) -> Vec<(f64, f64)> {
    detections.iter().map(|d| (d.frame as f64, d.x)).collect()
}

/// Drop points far from a provisional least-squares line and refit.
///
/// Returns `None` when either fit is degenerate (fewer than two points or
/// a single frame index).
pub fn reject_outliers(
    detections: &[Detection],
    config: &RejectionConfig,
) -> Option<RejectionOutcome> {
    let provisional = least_squares(&points_of(detections))?;

    let residuals: Vec<f64> = detections
        .iter()
        .map(|d| provisional.residual(d.frame as f64, d.x))
        .collect();
    let threshold = median(&residuals) * config.multiplier + config.offset;

    let kept: Vec<Detection> = detections
        .iter()
        .zip(&residuals)
        .filter(|(_, &r)| r < threshold)
        .map(|(d, _)| *d)
        .collect();

    let fit = least_squares(&points_of(&kept))?;
    let ys: Vec<f64> = kept.iter().map(|d| d.y).collect();

    Some(RejectionOutcome {
        fit,
        y_center: median(&ys),
        kept,
        threshold,
    })
}

/// Reduce detections to the one closest to `model` in each frame, in frame order.
pub fn one_per_frame(detections: &[Detection], model: &LinearFit) -> Vec<Detection> {
    let mut best: BTreeMap<usize, (f64, Detection)> = BTreeMap::new();
    for d in detections {
        let r = model.residual(d.frame as f64, d.x);
        best.entry(d.frame)
            .and_modify(|entry| {
                if r < entry.0 {
                    *entry = (r, *d);
                }
            })
            .or_insert((r, *d));
    }
    best.into_values().map(|(_, d)| d).collect()
}
