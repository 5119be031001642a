//! Cross-module tests for trajectory fitting and crop planning.

#[cfg(test)]
mod fitting_tests {
    use crate::tracking::automatic::AutomaticEstimator;
    use crate::tracking::config::TrackingConfig;
    use crate::tracking::outlier::{reject_outliers, RejectionConfig};
    use crate::tracking::ransac::{ransac_line, RansacConfig};
    use crate::tracking::stats::least_squares;
    use runstab_models::{Detection, TrajectorySource};

    /// Exact detections on `x = 2*frame + 100` plus five far-off false positives.
    fn line_with_outliers() -> Vec<Detection> {
        let mut detections: Vec<Detection> = (0..50)
            .map(|f| Detection::new(f, 2.0 * f as f64 + 100.0, 600.0, 1.0))
            .collect();
        for (f, x) in [(3, 1500.0), (11, 1700.0), (22, 1450.0), (35, 1800.0), (47, 1600.0)] {
            detections.push(Detection::new(f, x, 300.0, 0.5));
        }
        detections
    }

    #[test]
    fn test_ransac_refit_recovers_line() {
        let detections = line_with_outliers();

        let outcome = ransac_line(&detections, &RansacConfig::default()).unwrap();
        let points: Vec<(f64, f64)> = outcome
            .inliers
            .iter()
            .map(|d| (d.frame as f64, d.x))
            .collect();
        let fit = least_squares(&points).unwrap();

        assert!((fit.slope - 2.0).abs() < 0.05, "slope {}", fit.slope);
        assert!((fit.intercept - 100.0).abs() < 2.0, "intercept {}", fit.intercept);
        assert!(outcome.support() >= 45);
    }

    #[test]
    fn test_estimator_recovers_line_and_y_center() {
        let estimator = AutomaticEstimator::new(TrackingConfig::default());

        let trajectory = estimator
            .estimate(&line_with_outliers(), 50, 1920, 1080)
            .unwrap();

        match trajectory.source() {
            TrajectorySource::Fitted {
                fit,
                inliers,
                kept_after_rejection,
                detections,
            } => {
                assert!((fit.slope - 2.0).abs() < 0.05);
                assert!((fit.intercept - 100.0).abs() < 2.0);
                assert!(*inliers >= 45);
                assert_eq!(*kept_after_rejection, Some(50));
                assert_eq!(*detections, 55);
            }
            other => panic!("expected fitted trajectory, got {:?}", other),
        }
        assert_eq!(trajectory.y_center(), 600.0);
        assert!((trajectory.x_at(10).unwrap() - 120.0).abs() < 2.0);
    }

    #[test]
    fn test_estimator_is_deterministic() {
        let estimator = AutomaticEstimator::new(TrackingConfig::default());
        let detections = line_with_outliers();

        let a = estimator.estimate(&detections, 50, 1920, 1080).unwrap();
        let b = estimator.estimate(&detections, 50, 1920, 1080).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_rejection_drops_injected_point() {
        let mut detections: Vec<Detection> = (0..30)
            .map(|f| Detection::new(f, 3.0 * f as f64 + 200.0, 500.0, 1.0))
            .collect();
        detections[15].x += 500.0;

        let outcome = reject_outliers(&detections, &RejectionConfig::default()).unwrap();

        assert_eq!(outcome.kept.len(), 29);
        assert!(outcome.kept.iter().all(|d| d.frame != 15));
        assert!((outcome.fit.slope - 3.0).abs() < 1e-6);
        assert!((outcome.fit.intercept - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_detections_center_fallback() {
        let estimator = AutomaticEstimator::new(TrackingConfig::default());
        let detections = vec![
            Detection::new(0, 100.0, 200.0, 1.0),
            Detection::new(5, 300.0, 200.0, 1.0),
            Detection::new(9, 500.0, 200.0, 1.0),
        ];

        let trajectory = estimator.estimate(&detections, 12, 1921, 1081).unwrap();

        assert!(trajectory.is_fallback());
        assert_eq!(trajectory.len(), 12);
        assert!(trajectory.xs().iter().all(|&x| x == 960.0));
        assert_eq!(trajectory.y_center(), 540.0);
    }

    #[test]
    fn test_dense_output_stays_in_frame() {
        let estimator = AutomaticEstimator::new(TrackingConfig::default());
        // Fast runner leaves the frame on both sides.
        let detections: Vec<Detection> = (0..40)
            .map(|f| Detection::new(f + 30, 60.0 * f as f64 - 200.0, 500.0, 1.0))
            .collect();

        for n in [1, 2, 37, 200] {
            let trajectory = estimator.estimate(&detections, n, 1280, 720).unwrap();
            assert_eq!(trajectory.len(), n);
            assert!(trajectory.xs().iter().all(|&x| (0.0..=1279.0).contains(&x)));
        }
    }
}

#[cfg(test)]
mod manual_tests {
    use crate::tracking::manual::manual_trajectory;
    use runstab_models::ManualAnchors;

    #[test]
    fn test_interpolates_and_clips() {
        let anchors = ManualAnchors::new((0, 100.0, 200.0), (10, 300.0, 200.0));

        let trajectory = manual_trajectory(&anchors, 20, 350, 400).unwrap();

        assert_eq!(trajectory.x_at(5), Some(200.0));
        assert_eq!(trajectory.x_at(10), Some(300.0));
        assert_eq!(trajectory.x_at(15), Some(349.0));
        assert_eq!(trajectory.y_center(), 200.0);
    }

    #[test]
    fn test_dense_output_stays_in_frame() {
        let anchors = ManualAnchors::new((4, 10.0, 10.0), (6, 900.0, 900.0));

        for n in [1, 3, 50] {
            let trajectory = manual_trajectory(&anchors, n, 640, 480).unwrap();
            assert_eq!(trajectory.len(), n);
            assert!(trajectory.xs().iter().all(|&x| (0.0..=639.0).contains(&x)));
            assert!((0.0..=479.0).contains(&trajectory.y_center()));
        }
    }
}

#[cfg(test)]
mod planning_tests {
    use crate::tracking::automatic::AutomaticEstimator;
    use crate::tracking::config::{CropConfig, TrackingConfig};
    use crate::tracking::crop_planner::CropPlanner;
    use runstab_models::Detection;

    #[test]
    fn test_fitted_trajectory_plans_in_bounds_windows() {
        let detections: Vec<Detection> = (0..90)
            .map(|f| Detection::new(f, 1900.0 - 21.0 * f as f64, 700.0, 1.0))
            .collect();
        let trajectory = AutomaticEstimator::new(TrackingConfig::default())
            .estimate(&detections, 90, 1920, 1080)
            .unwrap();

        let plan = CropPlanner::new(CropConfig::default(), 1920, 1080)
            .plan(&trajectory)
            .unwrap();

        assert_eq!(plan.len(), 90);
        assert_eq!((plan.width, plan.height), (91, 162));
        assert_eq!(plan.y, 700 - 81);
        assert!(plan.windows().all(|w| w.fits_within(1920, 1080)));
        // Runner moves left, so does the crop
        assert!(plan.xs.first() > plan.xs.last());
    }
}
