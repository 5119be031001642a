//! Still-frame extraction for picking manual anchors.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::MediaResult;
use crate::source::FrameSource;

/// Default number of evenly spaced frames.
pub const DEFAULT_FRAME_PICKS: usize = 10;

/// Which frames to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSelection {
    /// `n` frames spread from the first to the last.
    Evenly(usize),
    /// Explicit indices, clamped to the video.
    Indices(Vec<usize>),
}

impl Default for FrameSelection {
    fn default() -> Self {
        Self::Evenly(DEFAULT_FRAME_PICKS)
    }
}

/// Sorted, de-duplicated frame indices within `[0, total)`.
pub fn resolve_indices(selection: &FrameSelection, total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let last = total - 1;

    let mut indices: Vec<usize> = match selection {
        FrameSelection::Evenly(0) => Vec::new(),
        FrameSelection::Evenly(1) => vec![0],
        FrameSelection::Evenly(n) => (0..*n).map(|i| i * last / (n - 1)).collect(),
        FrameSelection::Indices(picks) => picks.iter().map(|&i| i.min(last)).collect(),
    };
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Directory next to `input` named `<stem>_frames`.
pub fn frames_dir_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}_frames", stem))
}

/// File name for an extracted frame.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:04}.jpg", index)
}

/// Decode `source` and save the frames at `indices` as JPEGs in `out_dir`.
///
/// `indices` must be sorted. Returns the written `(index, path)` pairs.
pub async fn extract_frames(
    source: &mut dyn FrameSource,
    indices: &[usize],
    out_dir: &Path,
) -> MediaResult<Vec<(usize, PathBuf)>> {
    tokio::fs::create_dir_all(out_dir).await?;

    let mut written = Vec::with_capacity(indices.len());
    let mut wanted = indices.iter().peekable();

    while let Some(&&target) = wanted.peek() {
        let Some(frame) = source.next_frame().await? else {
            break;
        };
        if frame.index != target {
            continue;
        }

        let path = out_dir.join(frame_file_name(frame.index));
        frame.image.save(&path)?;
        info!("Saved frame {} -> {}", frame.index, path.display());
        written.push((frame.index, path));

        while wanted.next_if(|&&i| i <= frame.index).is_some() {}
    }

    if written.len() < indices.len() {
        warn!(
            "Video ended early: extracted {} of {} requested frames",
            written.len(),
            indices.len()
        );
    }

    source.close().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::probe::VideoInfo;
    use crate::source::MemoryFrameSource;
    use image::RgbImage;

    #[test]
    fn test_evenly_spaced_indices() {
        assert_eq!(
            resolve_indices(&FrameSelection::Evenly(10), 100),
            vec![0, 11, 22, 33, 44, 55, 66, 77, 88, 99]
        );
        assert_eq!(resolve_indices(&FrameSelection::Evenly(1), 100), vec![0]);
        assert_eq!(resolve_indices(&FrameSelection::Evenly(5), 3), vec![0, 1, 2]);
        assert!(resolve_indices(&FrameSelection::Evenly(10), 0).is_empty());
    }

    #[test]
    fn test_explicit_indices_are_clamped() {
        let selection = FrameSelection::Indices(vec![250, 8, 53, 8]);
        assert_eq!(resolve_indices(&selection, 120), vec![8, 53, 119]);
    }

    #[test]
    fn test_frames_dir_for() {
        assert_eq!(
            frames_dir_for(Path::new("/data/IMG_7335.MOV")),
            PathBuf::from("/data/IMG_7335_frames")
        );
        assert_eq!(frame_file_name(7), "frame_0007.jpg");
    }

    #[tokio::test]
    async fn test_extract_frames_writes_jpegs() {
        let dir = tempfile::tempdir().unwrap();
        let info = VideoInfo {
            duration: 0.2,
            width: 16,
            height: 8,
            fps: 30.0,
            frame_count: 6,
            rotation: 0,
            codec: "rawvideo".to_string(),
        };
        let frames = (0..6).map(|i| Frame::new(i, RgbImage::new(16, 8))).collect();
        let mut source = MemoryFrameSource::new(info, frames);

        let written = extract_frames(&mut source, &[1, 4, 9], dir.path())
            .await
            .unwrap();

        let indices: Vec<usize> = written.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 4]);
        assert!(dir.path().join("frame_0004.jpg").exists());
    }
}
