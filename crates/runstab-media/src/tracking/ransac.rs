//! Random sample consensus for linear horizontal motion.
//!
//! Each trial draws two distinct detections, fits the line through them,
//! and counts detections within the inlier threshold. The best-supported
//! line wins; ties keep the earlier trial.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::debug;

use runstab_models::{Detection, LinearFit};

/// RANSAC parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacConfig {
    pub trials: usize,
    pub inlier_threshold: f64,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            trials: 500,
            inlier_threshold: 80.0,
            seed: 42,
        }
    }
}

/// Best consensus found.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacOutcome {
    /// Line through the winning sample pair
    pub model: LinearFit,
    /// Detections within the threshold of `model`, in input order
    pub inliers: Vec<Detection>,
}

impl RansacOutcome {
    /// Number of inliers.
    pub fn support(&self) -> usize {
        self.inliers.len()
    }
}

fn count_inliers(model: &LinearFit, detections: &[Detection], threshold: f64) -> usize {
    detections
        .iter()
        .filter(|d| model.residual(d.frame as f64, d.x) < threshold)
        .count()
}

/// Find the linear trajectory `x = a*frame + b` with the largest support.
///
/// Returns `None` when fewer than two detections are given or every
/// sampled pair shared a frame index.
pub fn ransac_line(detections: &[Detection], config: &RansacConfig) -> Option<RansacOutcome> {
    if detections.len() < 2 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(LinearFit, usize)> = None;
    let mut skipped = 0usize;

    for _ in 0..config.trials {
        let pair = index::sample(&mut rng, detections.len(), 2);
        let (p, q) = (&detections[pair.index(0)], &detections[pair.index(1)]);

        // Same-frame pairs still consume a trial.
        let Some(model) = LinearFit::through(p.frame as f64, p.x, q.frame as f64, q.x) else {
            skipped += 1;
            continue;
        };

        let support = count_inliers(&model, detections, config.inlier_threshold);
        if best.map_or(true, |(_, count)| support > count) {
            best = Some((model, support));
        }
    }

    let (model, support) = best?;
    debug!(
        "RANSAC: best {} with {}/{} inliers ({} same-frame trials skipped)",
        model,
        support,
        detections.len(),
        skipped
    );

    let inliers = detections
        .iter()
        .filter(|d| model.residual(d.frame as f64, d.x) < config.inlier_threshold)
        .copied()
        .collect();

    Some(RansacOutcome { model, inliers })
}
