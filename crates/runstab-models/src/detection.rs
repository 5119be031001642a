//! Person detections in source pixel coordinates.

use serde::{Deserialize, Serialize};

/// A person candidate found in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Zero-based frame index in decode order
    pub frame: usize,
    /// Center x-coordinate in source pixels
    pub x: f64,
    /// Center y-coordinate in source pixels
    pub y: f64,
    /// Detector confidence (scale depends on the detector)
    pub confidence: f64,
}

impl Detection {
    /// Create a new detection.
    pub fn new(frame: usize, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            frame,
            x,
            y,
            confidence,
        }
    }
}

/// Detections for a single frame.
pub type FrameDetections = Vec<Detection>;

/// Flatten per-frame detections into one list, preserving frame order.
pub fn flatten_detections(per_frame: &[FrameDetections]) -> Vec<Detection> {
    per_frame.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_keeps_order_and_skips_empty_frames() {
        let per_frame = vec![
            vec![Detection::new(0, 10.0, 5.0, 1.0), Detection::new(0, 400.0, 5.0, 0.2)],
            Vec::new(),
            vec![Detection::new(2, 14.0, 5.0, 0.9)],
        ];

        let flat = flatten_detections(&per_frame);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[1].x, 400.0);
        assert_eq!(flat[2].frame, 2);
    }
}
