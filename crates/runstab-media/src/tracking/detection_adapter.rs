//! Adapter between decoded frames and the person detector.
//!
//! Restricts detection to a horizontal band of the frame, downsamples it,
//! and maps boxes back to source-pixel centers.

use image::imageops::{self, FilterType};
use tracing::debug;

use runstab_models::{Detection, FrameDetections};

use super::config::TrackingConfig;
use super::detector::PersonDetector;
use crate::error::MediaResult;
use crate::frame::Frame;

/// Per-frame candidate extraction over a region of interest.
pub struct CandidateDetector {
    detector: Box<dyn PersonDetector>,
    roi_top: f64,
    roi_bottom: f64,
    scale: f64,
}

impl CandidateDetector {
    /// Wrap a detector with the band and scale from `config`.
    pub fn new(detector: Box<dyn PersonDetector>, config: &TrackingConfig) -> Self {
        Self {
            detector,
            roi_top: config.roi_top,
            roi_bottom: config.roi_bottom,
            scale: config.detection_scale,
        }
    }

    /// Name of the wrapped detector.
    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Rows `[top, bottom)` searched in a frame of the given height.
    pub fn roi_rows(&self, height: u32) -> (u32, u32) {
        let top = (height as f64 * self.roi_top).floor() as u32;
        let bottom = (height as f64 * self.roi_bottom).floor() as u32;
        (top.min(height), bottom.min(height))
    }

    /// Person candidates in `frame`, in source pixel coordinates.
    pub fn detect(&mut self, frame: &Frame) -> MediaResult<FrameDetections> {
        let (width, height) = frame.image.dimensions();
        let (top, bottom) = self.roi_rows(height);
        if bottom <= top || width == 0 {
            return Ok(Vec::new());
        }

        let band = imageops::crop_imm(&frame.image, 0, top, width, bottom - top).to_image();
        let band = if (self.scale - 1.0).abs() < f64::EPSILON {
            band
        } else {
            let w = ((band.width() as f64 * self.scale).round() as u32).max(1);
            let h = ((band.height() as f64 * self.scale).round() as u32).max(1);
            imageops::resize(&band, w, h, FilterType::Triangle)
        };

        let boxes = self.detector.detect(&band)?;
        if !boxes.is_empty() {
            debug!("Frame {}: {} candidate(s)", frame.index, boxes.len());
        }

        Ok(boxes
            .into_iter()
            .map(|b| {
                Detection::new(
                    frame.index,
                    b.bbox.cx() / self.scale,
                    b.bbox.cy() / self.scale + top as f64,
                    b.confidence,
                )
            })
            .collect())
    }
}
