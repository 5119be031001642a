//! Crop geometry for rendering.

use serde::{Deserialize, Serialize};

/// Source-frame rectangle selected for one output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Crop width
    pub width: u32,
    /// Crop height
    pub height: u32,
}

impl CropWindow {
    /// Create a new crop window.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the window lies entirely inside a `width x height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Fixed-size crop with a constant top edge and a per-frame left edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropPlan {
    /// Crop width, constant for the video
    pub width: u32,
    /// Crop height, constant for the video
    pub height: u32,
    /// Top edge, constant for the video
    pub y: u32,
    /// Left edge for each frame
    pub xs: Vec<u32>,
}

impl CropPlan {
    /// Number of frames planned.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether the plan covers no frames.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Crop window for a frame.
    pub fn window(&self, frame: usize) -> Option<CropWindow> {
        self.xs
            .get(frame)
            .map(|&x| CropWindow::new(x, self.y, self.width, self.height))
    }

    /// Iterate over all planned windows in frame order.
    pub fn windows(&self) -> impl Iterator<Item = CropWindow> + '_ {
        self.xs
            .iter()
            .map(move |&x| CropWindow::new(x, self.y, self.width, self.height))
    }
}
