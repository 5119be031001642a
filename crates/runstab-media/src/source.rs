//! Sequential frame sources.
//!
//! [`FfmpegFrameSource`] decodes a file through FFmpeg's rawvideo output;
//! [`MemoryFrameSource`] replays frames already held in memory (frame cache
//! and tests).

use async_trait::async_trait;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::command::{stderr_tail, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::probe::{probe_video, VideoInfo};

/// Ordered stream of decoded frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Metadata of the underlying video.
    fn info(&self) -> &VideoInfo;

    /// Next frame in decode order, or `None` at end of stream.
    async fn next_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Release the decoder.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Frame source backed by an FFmpeg decode process.
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    next_index: usize,
}

impl FfmpegFrameSource {
    /// Probe and start decoding a video file.
    pub async fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path).await?;

        let (mut child, stderr) = FfmpegCommand::to_pipe(path).raw_rgb_output().spawn()?;
        let stdout = child.stdout.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stdout", None, None)
        })?;

        debug!(
            "Decoding {} ({}x{} @ {:.2}fps, ~{} frames)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            stdout: Some(stdout),
            stderr: Some(stderr),
            next_index: 0,
        })
    }

    /// Wait for the decoder after its stdout closed.
    async fn finish_decoder(&mut self) -> MediaResult<()> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(handle) => stderr_tail(handle).await,
            None => None,
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("Decoding {} failed", self.path.display()),
                stderr,
                status.code(),
            ))
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let frame_bytes = self.info.rgb_frame_bytes();
        let mut buffer = vec![0u8; frame_bytes];
        let mut filled = 0;
        while filled < frame_bytes {
            let n = stdout.read(&mut buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < frame_bytes {
            if filled > 0 {
                warn!(
                    "Discarding partial frame {} ({} of {} bytes) from {}",
                    self.next_index,
                    filled,
                    frame_bytes,
                    self.path.display()
                );
            }
            self.finish_decoder().await?;
            return Ok(None);
        }

        let image = RgbImage::from_raw(self.info.width, self.info.height, buffer)
            .ok_or_else(|| MediaError::internal("RGB buffer does not match frame size"))?;
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            // Stop the decoder if the caller is done before end of stream.
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        if let Some(handle) = self.stderr.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}

/// Frame source replaying frames held in memory.
pub struct MemoryFrameSource {
    info: VideoInfo,
    frames: VecDeque<Frame>,
}

impl MemoryFrameSource {
    /// Create a source over frames already in decode order.
    pub fn new(info: VideoInfo, frames: Vec<Frame>) -> Self {
        Self {
            info,
            frames: frames.into(),
        }
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.frames.clear();
        Ok(())
    }
}
