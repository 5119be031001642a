//! Decoded video frames.

use image::RgbImage;

/// An RGB frame and its zero-based position in decode order.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub image: RgbImage,
}

impl Frame {
    /// Create a new frame.
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
