//! Per-frame crop and resize rendering.
//!
//! Frames are pulled from a [`FrameSource`] in decode order, cropped at the
//! planned window, resized to the output size and pushed to a [`FrameSink`].

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Serialize;
use tracing::{info, warn};

use runstab_models::{CropPlan, CropWindow};

use crate::error::{MediaError, MediaResult};
use crate::sink::FrameSink;
use crate::source::FrameSource;

/// Outcome of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Frames written to the output
    pub frames_rendered: usize,
    /// Frames the crop plan covered
    pub frames_expected: usize,
    /// Decode ended before the plan did
    pub truncated: bool,
}

/// Render progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderProgress {
    pub frames_rendered: usize,
    pub frames_expected: usize,
}

impl RenderProgress {
    /// Completion percentage, capped at 100.
    pub fn percentage(&self) -> f64 {
        if self.frames_expected == 0 {
            return 100.0;
        }
        (self.frames_rendered as f64 * 100.0 / self.frames_expected as f64).min(100.0)
    }
}

/// Callback type for render progress updates.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync + 'static>;

/// Renders planned crops at a fixed output size.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryRenderer {
    output_width: u32,
    output_height: u32,
}

impl TrajectoryRenderer {
    /// Create a renderer producing `output_width x output_height` frames.
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output_width,
            output_height,
        }
    }

    /// Output frame size.
    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Crop one frame and scale it to the output size.
    pub fn render_frame(&self, image: &RgbImage, window: CropWindow) -> MediaResult<RgbImage> {
        if !window.fits_within(image.width(), image.height()) {
            return Err(MediaError::internal(format!(
                "crop {}x{}+{}+{} outside {}x{} frame",
                window.width,
                window.height,
                window.x,
                window.y,
                image.width(),
                image.height()
            )));
        }

        let cropped =
            imageops::crop_imm(image, window.x, window.y, window.width, window.height).to_image();
        Ok(imageops::resize(
            &cropped,
            self.output_width,
            self.output_height,
            FilterType::Triangle,
        ))
    }

    /// Render every planned frame from `source` into `sink`, then finish the sink.
    ///
    /// A source that ends early shortens the output; the shortfall is
    /// reported rather than treated as an error. `on_progress` is called
    /// at every tenth of the plan.
    pub async fn render(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        plan: &CropPlan,
        on_progress: Option<&(dyn Fn(RenderProgress) + Send + Sync)>,
    ) -> MediaResult<RenderReport> {
        let expected = plan.len();
        let log_every = (expected / 10).max(1);
        let mut rendered = 0usize;

        for window in plan.windows() {
            let Some(frame) = source.next_frame().await? else {
                break;
            };

            let out = self.render_frame(&frame.image, window)?;
            sink.write_frame(&out).await?;
            rendered += 1;

            if rendered % log_every == 0 {
                let progress = RenderProgress {
                    frames_rendered: rendered,
                    frames_expected: expected,
                };
                info!(
                    "Rendered {}/{} frames ({:.0}%)",
                    rendered,
                    expected,
                    progress.percentage()
                );
                if let Some(callback) = on_progress {
                    callback(progress);
                }
            }
        }

        let written = sink.finish().await?;
        if written != rendered {
            return Err(MediaError::internal(format!(
                "sink wrote {} frames, renderer sent {}",
                written, rendered
            )));
        }

        let truncated = rendered < expected;
        if truncated {
            warn!(
                "Input ended after {} of {} frames; output is shorter",
                rendered, expected
            );
        } else {
            info!("Rendered {} frames", rendered);
        }

        Ok(RenderReport {
            frames_rendered: rendered,
            frames_expected: expected,
            truncated,
        })
    }
}
