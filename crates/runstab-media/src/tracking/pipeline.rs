//! End-to-end stabilization run.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use runstab_models::{
    flatten_detections, CropPlan, FrameDetections, ManualAnchors, Trajectory, TrajectorySource,
};

use super::automatic::AutomaticEstimator;
use super::config::StabilizeConfig;
use super::crop_planner::CropPlanner;
use super::detection_adapter::CandidateDetector;
use super::detector::PersonDetector;
use super::manual::manual_trajectory;
use super::renderer::{ProgressCallback, RenderProgress, RenderReport, TrajectoryRenderer};
use crate::backend::VideoBackend;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::probe::VideoInfo;
use crate::sink::FrameSink;
use crate::source::{FrameSource, MemoryFrameSource};

/// How the subject trajectory is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingStrategy {
    /// Detect the runner and fit a robust linear path.
    Automatic,
    /// Interpolate between two user-picked positions.
    Manual(ManualAnchors),
}

impl TrackingStrategy {
    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual(_) => "manual",
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct StabilizeReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub strategy: &'static str,
    pub source_width: u32,
    pub source_height: u32,
    pub fps: f64,
    /// Frames the trajectory covers
    pub frame_count: usize,
    pub trajectory: TrajectorySource,
    pub y_center: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub crop_width: u32,
    pub crop_height: u32,
    pub crop_y: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub render: RenderReport,
    /// Degraded-mode notices
    pub warnings: Vec<String>,
}

/// Runs the detect, fit, plan and render stages over one video.
pub struct Stabilizer<B: VideoBackend> {
    backend: B,
    config: StabilizeConfig,
    detector: Option<Box<dyn PersonDetector>>,
    progress: Option<ProgressCallback>,
}

impl<B: VideoBackend> Stabilizer<B> {
    /// Create a stabilizer with a validated configuration.
    pub fn new(backend: B, config: StabilizeConfig) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            detector: None,
            progress: None,
        })
    }

    /// Person detector for the automatic strategy.
    pub fn with_detector(mut self, detector: Box<dyn PersonDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Report render progress at every tenth of the output.
    pub fn with_progress(
        mut self,
        callback: impl Fn(RenderProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &StabilizeConfig {
        &self.config
    }

    /// Stabilize `input` into `output`.
    ///
    /// Tracking finishes before the output is opened, so tracking failures
    /// never leave an output file behind. A failed render removes its
    /// partial output.
    pub async fn run(
        mut self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        strategy: TrackingStrategy,
    ) -> MediaResult<StabilizeReport> {
        let input = input.as_ref();
        let output = output.as_ref();

        info!(
            "Stabilizing {} -> {} ({})",
            input.display(),
            output.display(),
            strategy.name()
        );

        let mut warnings = Vec::new();
        let (info, trajectory, mut render_source) = match strategy {
            TrackingStrategy::Automatic => {
                let detector = self.detector.take().ok_or_else(|| {
                    MediaError::detector_unavailable("automatic tracking needs a person detector")
                })?;
                let adapter = CandidateDetector::new(detector, &self.config.tracking);
                self.track_automatic(input, adapter, &mut warnings).await?
            }
            TrackingStrategy::Manual(anchors) => self.track_manual(input, &anchors).await?,
        };

        info!("Step 3/3: Planning crop and rendering...");
        let plan = CropPlanner::new(self.config.crop.clone(), info.width, info.height)
            .plan(&trajectory)?;
        let (x_min, x_max) = trajectory.x_range();
        info!(
            "  Crop {}x{} at y={}, subject x {:.0}..{:.0}",
            plan.width, plan.height, plan.y, x_min, x_max
        );

        let renderer =
            TrajectoryRenderer::new(self.config.crop.output_width, self.config.crop.output_height);
        let render = self
            .render_to(render_source.as_mut(), output, info.fps, &plan, &renderer)
            .await;
        let _ = render_source.close().await;
        let render = render?;

        if render.truncated {
            warnings.push(format!(
                "input ended after {} of {} frames",
                render.frames_rendered, render.frames_expected
            ));
        }

        info!(
            "Stabilized {} frames into {}",
            render.frames_rendered,
            output.display()
        );

        Ok(StabilizeReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            strategy: strategy.name(),
            source_width: info.width,
            source_height: info.height,
            fps: info.fps,
            frame_count: trajectory.len(),
            trajectory: trajectory.source().clone(),
            y_center: trajectory.y_center(),
            x_min,
            x_max,
            crop_width: plan.width,
            crop_height: plan.height,
            crop_y: plan.y,
            output_width: self.config.crop.output_width,
            output_height: self.config.crop.output_height,
            render,
            warnings,
        })
    }

    async fn open_input(&self, input: &Path) -> MediaResult<(VideoInfo, Box<dyn FrameSource>)> {
        let source = self.backend.open_source(input).await?;
        let info = source.info().clone();
        info!(
            "Input: {}x{} @ {:.2}fps, {} frames, {:.2}s",
            info.width, info.height, info.fps, info.frame_count, info.duration
        );
        Ok((info, source))
    }

    /// Detect, fit, and return a source positioned at frame zero for rendering.
    async fn track_automatic(
        &self,
        input: &Path,
        mut adapter: CandidateDetector,
        warnings: &mut Vec<String>,
    ) -> MediaResult<(VideoInfo, Trajectory, Box<dyn FrameSource>)> {
        let (info, mut source) = self.open_input(input).await?;

        info!("Step 1/3: Detecting runner ({})...", adapter.detector_name());
        let detected = self.detect_all(source.as_mut(), &mut adapter).await;
        let _ = source.close().await;
        let (per_frame, cached) = detected?;

        let frame_count = per_frame.len();
        if frame_count == 0 {
            return Err(MediaError::InvalidVideo(format!(
                "no frames decoded from {}",
                input.display()
            )));
        }
        let detections = flatten_detections(&per_frame);
        info!(
            "  Found {} detection(s) in {} frames",
            detections.len(),
            frame_count
        );

        info!("Step 2/3: Fitting trajectory...");
        let trajectory = AutomaticEstimator::new(self.config.tracking.clone()).estimate(
            &detections,
            frame_count,
            info.width,
            info.height,
        )?;
        if trajectory.is_fallback() {
            warnings.push(format!(
                "only {} detection(s); centered crop used",
                detections.len()
            ));
        }

        let render_source: Box<dyn FrameSource> = match cached {
            Some(frames) => Box::new(MemoryFrameSource::new(info.clone(), frames)),
            None => self.backend.open_source(input).await?,
        };
        Ok((info, trajectory, render_source))
    }

    /// Interpolate from anchors; the opened source is reused for rendering.
    async fn track_manual(
        &self,
        input: &Path,
        anchors: &ManualAnchors,
    ) -> MediaResult<(VideoInfo, Trajectory, Box<dyn FrameSource>)> {
        let (info, mut source) = self.open_input(input).await?;

        info!("Step 1/3: Using manual anchors {}", anchors);
        info!("Step 2/3: Interpolating trajectory...");
        let trajectory = match manual_trajectory(anchors, info.frame_count, info.width, info.height)
        {
            Ok(trajectory) => trajectory,
            Err(e) => {
                let _ = source.close().await;
                return Err(e);
            }
        };

        Ok((info, trajectory, source))
    }

    /// Run the detector over every frame, keeping the frames when caching.
    async fn detect_all(
        &self,
        source: &mut dyn FrameSource,
        adapter: &mut CandidateDetector,
    ) -> MediaResult<(Vec<FrameDetections>, Option<Vec<Frame>>)> {
        let mut per_frame = Vec::new();
        let mut cached = self.config.cache_frames.then(Vec::new);

        while let Some(frame) = source.next_frame().await? {
            per_frame.push(adapter.detect(&frame)?);
            if let Some(frames) = cached.as_mut() {
                frames.push(frame);
            }
        }

        Ok((per_frame, cached))
    }

    /// Open the sink, render, and remove the output if rendering fails.
    async fn render_to(
        &self,
        source: &mut dyn FrameSource,
        output: &Path,
        fps: f64,
        plan: &CropPlan,
        renderer: &TrajectoryRenderer,
    ) -> MediaResult<RenderReport> {
        let (out_w, out_h) = renderer.output_size();
        let mut sink: Box<dyn FrameSink> = self.backend.open_sink(output, fps, out_w, out_h).await?;

        match renderer
            .render(source, sink.as_mut(), plan, self.progress.as_deref())
            .await
        {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!("Render failed, removing {}", output.display());
                drop(sink);
                self.backend.discard_output(output).await;
                Err(e)
            }
        }
    }
}
