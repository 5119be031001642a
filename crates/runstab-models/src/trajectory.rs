//! Subject trajectories used to drive cropping.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Linear model `x = slope * frame + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Horizontal speed in pixels per frame
    pub slope: f64,
    /// Position at frame zero
    pub intercept: f64,
}

impl LinearFit {
    /// Create a new linear fit.
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Line passing through two `(frame, x)` points.
    ///
    /// Returns `None` when both points share a frame index.
    pub fn through(f1: f64, x1: f64, f2: f64, x2: f64) -> Option<Self> {
        if f1 == f2 {
            return None;
        }
        let slope = (x2 - x1) / (f2 - f1);
        Some(Self {
            slope,
            intercept: x1 - slope * f1,
        })
    }

    /// Evaluate the model at a frame index.
    #[inline]
    pub fn at(&self, frame: f64) -> f64 {
        self.slope * frame + self.intercept
    }

    /// Absolute horizontal residual of a point.
    #[inline]
    pub fn residual(&self, frame: f64, x: f64) -> f64 {
        (x - self.at(frame)).abs()
    }
}

impl std::fmt::Display for LinearFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x = {:.2}*frame + {:.0}", self.slope, self.intercept)
    }
}

/// Two user-picked subject positions bounding the calibrated span.
///
/// `start_frame <= end_frame` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualAnchors {
    pub start_frame: i64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_frame: i64,
    pub end_x: f64,
    pub end_y: f64,
}

impl ManualAnchors {
    /// Create anchors from `(frame, x, y)` pairs.
    pub fn new(start: (i64, f64, f64), end: (i64, f64, f64)) -> Self {
        Self {
            start_frame: start.0,
            start_x: start.1,
            start_y: start.2,
            end_frame: end.0,
            end_x: end.1,
            end_y: end.2,
        }
    }

    /// Build anchors from six integers in
    /// `start_frame start_x start_y end_frame end_x end_y` order.
    pub fn from_values(values: &[i64]) -> ModelResult<Self> {
        match values {
            [sf, sx, sy, ef, ex, ey] => Ok(Self::new(
                (*sf, *sx as f64, *sy as f64),
                (*ef, *ex as f64, *ey as f64),
            )),
            _ => Err(ModelError::InvalidAnchors(format!(
                "expected 6 values, got {}",
                values.len()
            ))),
        }
    }

    /// Frame distance between the anchors, never below one.
    pub fn span(&self) -> f64 {
        (self.end_frame - self.start_frame).max(1) as f64
    }

    /// Horizontal speed in pixels per frame.
    pub fn speed_x(&self) -> f64 {
        (self.end_x - self.start_x) / self.span()
    }

    /// Vertical speed in pixels per frame.
    pub fn speed_y(&self) -> f64 {
        (self.end_y - self.start_y) / self.span()
    }
}

impl std::fmt::Display for ManualAnchors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame{}({},{}) -> frame{}({},{})",
            self.start_frame, self.start_x, self.start_y, self.end_frame, self.end_x, self.end_y
        )
    }
}

/// How a trajectory was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrajectorySource {
    /// Robust fit over detector output.
    Fitted {
        fit: LinearFit,
        /// RANSAC consensus size
        inliers: usize,
        /// Points kept by the secondary rejection pass, if it ran
        kept_after_rejection: Option<usize>,
        /// Total detections considered
        detections: usize,
    },
    /// Interpolated between user anchors.
    Manual { anchors: ManualAnchors },
    /// Too few detections; frame center used for every frame.
    CenterFallback { detections: usize },
}

/// Dense per-frame subject position plus a fixed vertical center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    xs: Vec<f64>,
    y_center: f64,
    source: TrajectorySource,
}

impl Trajectory {
    /// Create a trajectory covering `xs.len()` frames.
    pub fn new(xs: Vec<f64>, y_center: f64, source: TrajectorySource) -> ModelResult<Self> {
        if xs.is_empty() {
            return Err(ModelError::EmptyTrajectory);
        }
        Ok(Self {
            xs,
            y_center,
            source,
        })
    }

    /// Number of frames covered.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed trajectory.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Horizontal positions, one per frame.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Horizontal position at a frame.
    pub fn x_at(&self, frame: usize) -> Option<f64> {
        self.xs.get(frame).copied()
    }

    /// Vertical center for the whole video.
    pub fn y_center(&self) -> f64 {
        self.y_center
    }

    /// Provenance of the trajectory.
    pub fn source(&self) -> &TrajectorySource {
        &self.source
    }

    /// True when no tracking took place.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, TrajectorySource::CenterFallback { .. })
    }

    /// Minimum and maximum horizontal position.
    pub fn x_range(&self) -> (f64, f64) {
        self.xs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_through_two_points() {
        let fit = LinearFit::through(10.0, 120.0, 20.0, 140.0).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 100.0).abs() < 1e-9);
        assert!((fit.residual(30.0, 150.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_through_same_frame_is_none() {
        assert!(LinearFit::through(4.0, 10.0, 4.0, 90.0).is_none());
    }

    #[test]
    fn test_anchor_speed_guards_zero_span() {
        let anchors = ManualAnchors::new((7, 100.0, 50.0), (7, 300.0, 90.0));
        assert_eq!(anchors.span(), 1.0);
        assert_eq!(anchors.speed_x(), 200.0);
        assert_eq!(anchors.speed_y(), 40.0);
    }

    #[test]
    fn test_anchors_from_values() {
        let anchors = ManualAnchors::from_values(&[8, 988, 540, 53, 78, 560]).unwrap();
        assert_eq!(anchors.start_frame, 8);
        assert_eq!(anchors.end_x, 78.0);
        assert!(ManualAnchors::from_values(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_trajectory_rejects_empty() {
        let err = Trajectory::new(Vec::new(), 0.0, TrajectorySource::CenterFallback { detections: 0 });
        assert_eq!(err.unwrap_err(), ModelError::EmptyTrajectory);
    }

    #[test]
    fn test_trajectory_range_and_source_tag() {
        let trajectory = Trajectory::new(
            vec![300.0, 120.0, 480.0],
            540.0,
            TrajectorySource::CenterFallback { detections: 2 },
        )
        .unwrap();

        assert_eq!(trajectory.x_range(), (120.0, 480.0));
        assert!(trajectory.is_fallback());
        assert_eq!(trajectory.x_at(3), None);

        let json = serde_json::to_value(trajectory.source()).unwrap();
        assert_eq!(json["kind"], "center_fallback");
    }
}
