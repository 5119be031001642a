//! Trajectory from two user-supplied anchors.
//!
//! Positions are linearly extrapolated from the start anchor at the anchor
//! speed and clipped to the frame.

use tracing::info;

use runstab_models::{ManualAnchors, Trajectory, TrajectorySource};

use super::stats::mean;
use crate::error::{MediaError, MediaResult};

/// Build a dense trajectory for `frame_count` frames of a `width x height` video.
///
/// The vertical center is the mean interpolated y over the anchor span,
/// or over every frame when the span lies outside the video.
pub fn manual_trajectory(
    anchors: &ManualAnchors,
    frame_count: usize,
    width: u32,
    height: u32,
) -> MediaResult<Trajectory> {
    if frame_count == 0 {
        return Err(MediaError::InvalidVideo("no frames to track".to_string()));
    }

    let (speed_x, speed_y) = (anchors.speed_x(), anchors.speed_y());
    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;
    let start = anchors.start_frame as f64;

    let xs: Vec<f64> = (0..frame_count)
        .map(|i| (anchors.start_x + speed_x * (i as f64 - start)).clamp(0.0, max_x))
        .collect();
    let ys: Vec<f64> = (0..frame_count)
        .map(|i| (anchors.start_y + speed_y * (i as f64 - start)).clamp(0.0, max_y))
        .collect();

    let last = frame_count as i64 - 1;
    let lo = anchors.start_frame.max(0);
    let hi = anchors.end_frame.min(last);
    let y_center = if lo <= hi {
        mean(&ys[lo as usize..=hi as usize])
    } else {
        mean(&ys)
    };

    info!(
        "Manual trajectory {}: {:.2} px/frame, y center {:.0}",
        anchors, speed_x, y_center
    );

    Ok(Trajectory::new(
        xs,
        y_center,
        TrajectorySource::Manual { anchors: *anchors },
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_mean_for_y_center() {
        let anchors = ManualAnchors::new((2, 100.0, 100.0), (4, 100.0, 300.0));

        let trajectory = manual_trajectory(&anchors, 10, 640, 1000).unwrap();

        // y at frames 2, 3, 4 is 100, 200, 300
        assert!((trajectory.y_center() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_span_outside_video_uses_all_frames() {
        let anchors = ManualAnchors::new((50, 10.0, 40.0), (60, 10.0, 40.0));

        let trajectory = manual_trajectory(&anchors, 5, 640, 480).unwrap();

        assert_eq!(trajectory.y_center(), 40.0);
        assert_eq!(trajectory.len(), 5);
    }

    #[test]
    fn test_negative_speed_clips_at_zero() {
        let anchors = ManualAnchors::new((8, 988.0, 540.0), (53, 78.0, 560.0));

        let trajectory = manual_trajectory(&anchors, 120, 1920, 1080).unwrap();

        assert_eq!(trajectory.x_at(8), Some(988.0));
        assert_eq!(trajectory.x_at(119), Some(0.0));
        assert!(trajectory.xs().iter().all(|&x| (0.0..=1919.0).contains(&x)));
    }

    #[test]
    fn test_zero_frames_is_an_error() {
        let anchors = ManualAnchors::new((0, 0.0, 0.0), (1, 1.0, 1.0));
        assert!(manual_trajectory(&anchors, 0, 640, 480).is_err());
    }
}
