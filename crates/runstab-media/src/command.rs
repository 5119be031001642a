//! FFmpeg command builder and process helpers.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Target used for stdin/stdout pipes.
pub const PIPE: &str = "-";

/// FFmpeg `-v` level.
const FFMPEG_LOG_LEVEL: &str = "error";

/// Lines of FFmpeg stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path or `-` for stdin
    input: String,
    /// Output file path or `-` for stdout
    output: String,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a command that decodes a file to stdout.
    pub fn to_pipe(input: impl AsRef<Path>) -> Self {
        Self::with_targets(input.as_ref().to_string_lossy(), PIPE)
    }

    /// Create a command that encodes stdin to a file.
    pub fn from_pipe(output: impl AsRef<Path>) -> Self {
        Self::with_targets(PIPE, output.as_ref().to_string_lossy())
    }

    fn with_targets(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Describe packed RGB24 frames on the input side.
    pub fn raw_rgb_input(self, width: u32, height: u32, fps: f64) -> Self {
        self.input_args([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            format!("{}x{}", width, height),
            "-r".to_string(),
            format!("{}", fps),
        ])
    }

    /// Emit packed RGB24 frames on the output side, without audio.
    pub fn raw_rgb_output(self) -> Self {
        self.output_args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24"])
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(FFMPEG_LOG_LEVEL.to_string());

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.clone());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.clone());

        args
    }

    /// Spawn FFmpeg with piped stdio and a stderr collector.
    pub fn spawn(&self) -> MediaResult<(Child, JoinHandle<String>)> {
        check_ffmpeg()?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let stdin = if self.input == PIPE {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let stdout = if self.output == PIPE {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None)
            })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stderr", None, None)
        })?;

        Ok((child, collect_stderr(stderr)))
    }
}

/// Drain FFmpeg stderr in the background, keeping the last lines.
///
/// Draining keeps FFmpeg from blocking on a full pipe.
pub fn collect_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();

        while let Ok(Some(line)) = reader.next_line().await {
            debug!(target: "runstab_media::ffmpeg", "{}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.remove(0);
            }
            tail.push(line);
        }

        tail.join("\n")
    })
}

/// Await a stderr collector, returning `None` when nothing was printed.
pub async fn stderr_tail(handle: JoinHandle<String>) -> Option<String> {
    handle.await.ok().filter(|s| !s.trim().is_empty())
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_to_pipe_args() {
        let args = FfmpegCommand::to_pipe("run.mov").raw_rgb_output().build_args();

        assert_eq!(args[0], "-y");
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "run.mov");
        assert!(args.contains(&"rgb24".to_string()));
        assert_eq!(args.last().map(String::as_str), Some(PIPE));
    }

    #[test]
    fn test_encode_from_pipe_args() {
        let args = FfmpegCommand::from_pipe("out.mp4")
            .raw_rgb_input(1080, 1920, 29.97)
            .output_args(["-c:v", "libx264"])
            .build_args();

        let size_pos = args.iter().position(|a| a == "-s").unwrap();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(size_pos < input_pos, "raw input options must precede -i");
        assert_eq!(args[size_pos + 1], "1080x1920");
        assert!(args.contains(&"29.97".to_string()));
        assert_eq!(args[input_pos + 1], PIPE);
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }
}
