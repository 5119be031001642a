//! End-to-end pipeline tests over an in-memory video backend.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use runstab_media::tracking::{CropConfig, PersonBox, PersonDetector, StabilizeConfig};
use runstab_media::{
    Frame, FrameSink, FrameSource, MediaError, MediaResult, MemoryFrameSource, RenderProgress,
    Stabilizer, TrackingStrategy, VideoBackend, VideoInfo,
};
use runstab_models::{BoundingBox, ManualAnchors, TrajectorySource};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

#[derive(Default)]
struct Recorded {
    opens: usize,
    outputs: HashMap<PathBuf, Vec<(u32, u32)>>,
    discarded: Vec<PathBuf>,
}

/// Serves prepared frame lists and records what the sinks receive.
#[derive(Clone, Default)]
struct MemoryBackend {
    videos: Arc<HashMap<PathBuf, (VideoInfo, Vec<Frame>)>>,
    recorded: Arc<Mutex<Recorded>>,
    fail_after: Option<usize>,
}

impl MemoryBackend {
    fn with_video(path: &str, info: VideoInfo, frames: Vec<Frame>) -> Self {
        let mut videos = HashMap::new();
        videos.insert(PathBuf::from(path), (info, frames));
        Self {
            videos: Arc::new(videos),
            ..Default::default()
        }
    }

    fn output(&self, path: &str) -> Option<Vec<(u32, u32)>> {
        self.recorded.lock().unwrap().outputs.get(Path::new(path)).cloned()
    }

    fn opens(&self) -> usize {
        self.recorded.lock().unwrap().opens
    }
}

struct MemorySink {
    path: PathBuf,
    recorded: Arc<Mutex<Recorded>>,
    fail_after: Option<usize>,
    written: usize,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()> {
        if self.fail_after == Some(self.written) {
            return Err(MediaError::ffmpeg_failed("disk full", None, Some(1)));
        }
        self.recorded
            .lock()
            .unwrap()
            .outputs
            .entry(self.path.clone())
            .or_default()
            .push(image.dimensions());
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<usize> {
        Ok(self.written)
    }
}

#[async_trait]
impl VideoBackend for MemoryBackend {
    async fn open_source(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        let (info, frames) = self
            .videos
            .get(path)
            .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))?;
        self.recorded.lock().unwrap().opens += 1;
        Ok(Box::new(MemoryFrameSource::new(info.clone(), frames.clone())))
    }

    async fn open_sink(
        &self,
        path: &Path,
        _fps: f64,
        _width: u32,
        _height: u32,
    ) -> MediaResult<Box<dyn FrameSink>> {
        self.recorded
            .lock()
            .unwrap()
            .outputs
            .insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemorySink {
            path: path.to_path_buf(),
            recorded: self.recorded.clone(),
            fail_after: self.fail_after,
            written: 0,
        }))
    }

    async fn discard_output(&self, path: &Path) {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.outputs.remove(path);
        recorded.discarded.push(path.to_path_buf());
    }
}

/// Finds the bright vertical bar painted into synthetic frames.
struct BrightBarDetector;

impl PersonDetector for BrightBarDetector {
    fn name(&self) -> &str {
        "bright-bar"
    }

    fn detect(&mut self, image: &RgbImage) -> MediaResult<Vec<PersonBox>> {
        let bright: Vec<u32> = (0..image.width())
            .filter(|&x| (0..image.height()).any(|y| image.get_pixel(x, y).0[0] > 128))
            .collect();
        match (bright.first(), bright.last()) {
            (Some(&lo), Some(&hi)) => Ok(vec![PersonBox::new(
                BoundingBox::new(lo as f64, 0.0, (hi - lo + 1) as f64, image.height() as f64),
                1.0,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

fn info(frame_count: usize) -> VideoInfo {
    VideoInfo {
        duration: frame_count as f64 / 30.0,
        width: WIDTH,
        height: HEIGHT,
        fps: 30.0,
        frame_count,
        rotation: 0,
        codec: "rawvideo".to_string(),
    }
}

/// Runner bar moving right at 2 px/frame from x=40.
fn runner_frames(count: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let mut image = RgbImage::new(WIDTH, HEIGHT);
            let cx = 40 + 2 * i as u32;
            for y in 60..130 {
                for x in cx - 4..cx + 4 {
                    image.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
            Frame::new(i, image)
        })
        .collect()
}

fn blank_frames(count: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| Frame::new(i, RgbImage::new(WIDTH, HEIGHT)))
        .collect()
}

fn small_output() -> StabilizeConfig {
    StabilizeConfig {
        crop: CropConfig {
            output_width: 270,
            output_height: 480,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_automatic_run_renders_every_frame() {
    let backend = MemoryBackend::with_video("run.mov", info(100), runner_frames(100));

    let report = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .with_detector(Box::new(BrightBarDetector))
        .run("run.mov", "out.mp4", TrackingStrategy::Automatic)
        .await
        .unwrap();

    let written = backend.output("out.mp4").unwrap();
    assert_eq!(written.len(), 100);
    assert!(written.iter().all(|&dims| dims == (270, 480)));

    assert_eq!(report.render.frames_rendered, 100);
    assert!(!report.render.truncated);
    assert!(report.warnings.is_empty());
    assert_eq!((report.crop_width, report.crop_height), (15, 27));
    match report.trajectory {
        TrajectorySource::Fitted { fit, detections, .. } => {
            assert_eq!(detections, 100);
            assert!((fit.slope - 2.0).abs() < 0.1, "slope {}", fit.slope);
            assert!((fit.intercept - 40.0).abs() < 3.0, "intercept {}", fit.intercept);
        }
        other => panic!("expected fitted trajectory, got {:?}", other),
    }
    // Decoded once for detection, once for rendering
    assert_eq!(backend.opens(), 2);
}

#[tokio::test]
async fn test_frame_cache_skips_second_decode() {
    let backend = MemoryBackend::with_video("run.mov", info(40), runner_frames(40));
    let config = StabilizeConfig {
        cache_frames: true,
        ..small_output()
    };

    let report = Stabilizer::new(backend.clone(), config)
        .unwrap()
        .with_detector(Box::new(BrightBarDetector))
        .run("run.mov", "out.mp4", TrackingStrategy::Automatic)
        .await
        .unwrap();

    assert_eq!(report.render.frames_rendered, 40);
    assert_eq!(backend.opens(), 1);
}

#[tokio::test]
async fn test_no_detections_falls_back_to_center() {
    let backend = MemoryBackend::with_video("empty.mov", info(20), blank_frames(20));

    let report = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .with_detector(Box::new(BrightBarDetector))
        .run("empty.mov", "out.mp4", TrackingStrategy::Automatic)
        .await
        .unwrap();

    assert!(matches!(
        report.trajectory,
        TrajectorySource::CenterFallback { detections: 0 }
    ));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!((report.x_min, report.x_max), (160.0, 160.0));
    assert_eq!(report.y_center, 90.0);
    assert_eq!(backend.output("out.mp4").unwrap().len(), 20);
}

#[tokio::test]
async fn test_manual_run_needs_no_detector() {
    let backend = MemoryBackend::with_video("run.mov", info(30), blank_frames(30));
    let anchors = ManualAnchors::new((5, 50.0, 90.0), (25, 250.0, 90.0));

    let report = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .run("run.mov", "out.mp4", TrackingStrategy::Manual(anchors))
        .await
        .unwrap();

    assert_eq!(report.strategy, "manual");
    assert_eq!(report.render.frames_rendered, 30);
    assert_eq!(report.x_min, 0.0);
    assert_eq!(report.x_max, 290.0);
    // Source is reused for rendering
    assert_eq!(backend.opens(), 1);
}

#[tokio::test]
async fn test_render_progress_reported_every_tenth() {
    let backend = MemoryBackend::with_video("run.mov", info(50), blank_frames(50));
    let anchors = ManualAnchors::new((0, 160.0, 90.0), (49, 160.0, 90.0));
    let seen: Arc<Mutex<Vec<RenderProgress>>> = Arc::default();
    let sink = Arc::clone(&seen);

    Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .with_progress(move |p| sink.lock().unwrap().push(p))
        .run("run.mov", "out.mp4", TrackingStrategy::Manual(anchors))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let rendered: Vec<usize> = seen.iter().map(|p| p.frames_rendered).collect();
    assert_eq!(rendered, (1..=10).map(|i| i * 5).collect::<Vec<_>>());
    assert!(seen.iter().all(|p| p.frames_expected == 50));
    assert_eq!(seen.last().map(RenderProgress::percentage), Some(100.0));
}

#[tokio::test]
async fn test_manual_run_default_portrait_output() {
    let backend = MemoryBackend::with_video("run.mov", info(3), blank_frames(3));
    let anchors = ManualAnchors::new((0, 100.0, 90.0), (2, 140.0, 90.0));

    Stabilizer::new(backend.clone(), StabilizeConfig::default())
        .unwrap()
        .run("run.mov", "out.mp4", TrackingStrategy::Manual(anchors))
        .await
        .unwrap();

    assert_eq!(backend.output("out.mp4").unwrap(), vec![(1080, 1920); 3]);
}

#[tokio::test]
async fn test_short_decode_is_reported() {
    // Metadata claims more frames than the stream delivers.
    let backend = MemoryBackend::with_video("short.mov", info(50), blank_frames(42));
    let anchors = ManualAnchors::new((0, 160.0, 90.0), (49, 160.0, 90.0));

    let report = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .run("short.mov", "out.mp4", TrackingStrategy::Manual(anchors))
        .await
        .unwrap();

    assert!(report.render.truncated);
    assert_eq!(report.render.frames_rendered, 42);
    assert_eq!(report.render.frames_expected, 50);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(backend.output("out.mp4").unwrap().len(), 42);
}

#[tokio::test]
async fn test_missing_detector_fails_before_output() {
    let backend = MemoryBackend::with_video("run.mov", info(10), runner_frames(10));

    let result = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .run("run.mov", "out.mp4", TrackingStrategy::Automatic)
        .await;

    assert!(matches!(result, Err(MediaError::DetectorUnavailable(_))));
    assert!(backend.output("out.mp4").is_none());
    assert_eq!(backend.opens(), 0);
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let backend = MemoryBackend::default();

    let result = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .with_detector(Box::new(BrightBarDetector))
        .run("nope.mov", "out.mp4", TrackingStrategy::Automatic)
        .await;

    assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    assert!(backend.output("out.mp4").is_none());
}

#[tokio::test]
async fn test_empty_video_is_fatal() {
    let backend = MemoryBackend::with_video("zero.mov", info(0), Vec::new());

    let result = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .with_detector(Box::new(BrightBarDetector))
        .run("zero.mov", "out.mp4", TrackingStrategy::Automatic)
        .await;

    assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
    assert!(backend.output("out.mp4").is_none());
}

#[tokio::test]
async fn test_failed_render_discards_output() {
    let mut backend = MemoryBackend::with_video("run.mov", info(20), blank_frames(20));
    backend.fail_after = Some(7);
    let anchors = ManualAnchors::new((0, 160.0, 90.0), (19, 160.0, 90.0));

    let result = Stabilizer::new(backend.clone(), small_output())
        .unwrap()
        .run("run.mov", "out.mp4", TrackingStrategy::Manual(anchors))
        .await;

    assert!(matches!(result, Err(MediaError::FfmpegFailed { .. })));
    assert!(backend.output("out.mp4").is_none());
    assert_eq!(
        backend.recorded.lock().unwrap().discarded,
        vec![PathBuf::from("out.mp4")]
    );
}
