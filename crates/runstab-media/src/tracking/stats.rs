//! Statistical helpers for trajectory fitting.

use std::cmp::Ordering;

use runstab_models::LinearFit;

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, zero for an empty slice. Even lengths average the middle pair.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Ordinary least squares of `x` on `frame` over `(frame, x)` points.
///
/// Returns `None` for fewer than two points or when every point shares
/// one frame value.
pub fn least_squares(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_f = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_x = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sff) = points.iter().fold((0.0, 0.0), |(sxy, sff), &(f, x)| {
        let df = f - mean_f;
        (sxy + df * (x - mean_x), sff + df * df)
    });

    if sff <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sff;
    Some(LinearFit::new(slope, mean_x - slope * mean_f))
}
