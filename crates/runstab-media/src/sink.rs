//! Ordered frame sinks.

use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use tracing::debug;

use runstab_models::EncodingConfig;

use crate::command::{stderr_tail, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Accepts frames in order and produces an output video.
#[async_trait]
pub trait FrameSink: Send {
    /// Append one frame.
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()>;

    /// Flush and close the output, returning the number of frames written.
    async fn finish(&mut self) -> MediaResult<usize>;
}

/// Frame sink backed by an FFmpeg encode process reading RGB24 on stdin.
pub struct FfmpegFrameSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frames_written: usize,
}

impl FfmpegFrameSink {
    /// Start an encoder writing `path` at the given rate and size.
    pub async fn create(
        path: impl AsRef<Path>,
        fps: f64,
        width: u32,
        height: u32,
        encoding: &EncodingConfig,
    ) -> MediaResult<Self> {
        let path = path.as_ref();

        if width == 0 || height == 0 {
            return Err(MediaError::output_unavailable(path, "zero output size"));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(MediaError::output_unavailable(
                    path,
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }

        let (mut child, stderr) = FfmpegCommand::from_pipe(path)
            .raw_rgb_input(width, height, fps)
            .output_args(encoding.to_ffmpeg_args())
            .spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stdin", None, None)
        })?;

        debug!(
            "Encoding {} ({}x{} @ {:.2}fps, {} crf {})",
            path.display(),
            width,
            height,
            fps,
            encoding.codec,
            encoding.crf
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child: Some(child),
            stdin: Some(stdin),
            stderr: Some(stderr),
            frames_written: 0,
        })
    }

    async fn encoder_error(&mut self, message: String) -> MediaError {
        self.stdin = None;
        let code = match self.child.take() {
            Some(mut child) => child.wait().await.ok().and_then(|s| s.code()),
            None => None,
        };
        let stderr = match self.stderr.take() {
            Some(handle) => stderr_tail(handle).await,
            None => None,
        };
        MediaError::ffmpeg_failed(message, stderr, code)
    }
}

#[async_trait]
impl FrameSink for FfmpegFrameSink {
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()> {
        if image.dimensions() != (self.width, self.height) {
            return Err(MediaError::internal(format!(
                "frame is {}x{}, encoder expects {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MediaError::internal("encoder already finished"));
        };

        if let Err(e) = stdin.write_all(image.as_raw()).await {
            let message = format!(
                "Encoder for {} stopped accepting frames at frame {}: {}",
                self.path.display(),
                self.frames_written,
                e
            );
            return Err(self.encoder_error(message).await);
        }

        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<usize> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush().await?;
            // Dropping stdin signals end of input to FFmpeg.
        }

        let Some(mut child) = self.child.take() else {
            return Ok(self.frames_written);
        };

        let status = child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(handle) => stderr_tail(handle).await,
            None => None,
        };

        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                format!("Encoding {} failed", self.path.display()),
                stderr,
                status.code(),
            ));
        }

        Ok(self.frames_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_missing_directory() {
        let result = FfmpegFrameSink::create(
            "/no/such/dir/out.mp4",
            30.0,
            1080,
            1920,
            &EncodingConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(MediaError::OutputUnavailable { .. })));
    }
}
