//! Video decode/encode capabilities consumed by the pipeline.

use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use runstab_models::EncodingConfig;

use crate::error::MediaResult;
use crate::sink::{FfmpegFrameSink, FrameSink};
use crate::source::{FfmpegFrameSource, FrameSource};

/// Opens frame sources and sinks for the pipeline.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Open a video for sequential decoding.
    async fn open_source(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;

    /// Open an output video accepting `width x height` frames.
    async fn open_sink(
        &self,
        path: &Path,
        fps: f64,
        width: u32,
        height: u32,
    ) -> MediaResult<Box<dyn FrameSink>>;

    /// Remove an output left behind by a failed render.
    async fn discard_output(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial output {}: {}", path.display(), e);
            }
        }
    }
}

/// FFmpeg/FFprobe command-line backend.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    encoding: EncodingConfig,
}

impl FfmpegBackend {
    /// Create a backend encoding with the given settings.
    pub fn new(encoding: EncodingConfig) -> Self {
        Self { encoding }
    }
}

#[async_trait]
impl VideoBackend for FfmpegBackend {
    async fn open_source(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameSource::open(path).await?))
    }

    async fn open_sink(
        &self,
        path: &Path,
        fps: f64,
        width: u32,
        height: u32,
    ) -> MediaResult<Box<dyn FrameSink>> {
        Ok(Box::new(
            FfmpegFrameSink::create(path, fps, width, height, &self.encoding).await?,
        ))
    }
}
