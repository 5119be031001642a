#![deny(unreachable_patterns)]
//! Video I/O and runner tracking for RunStab.
//!
//! This crate provides:
//! - FFprobe metadata and FFmpeg raw-frame decode/encode pipes
//! - Async frame source/sink capabilities behind a swappable backend
//! - Person detection, robust trajectory fitting and crop planning
//! - The end-to-end [`Stabilizer`] pipeline
//! - Still-frame extraction for picking manual anchors

pub mod backend;
pub mod command;
pub mod error;
pub mod extract;
pub mod frame;
pub mod probe;
pub mod sink;
pub mod source;
pub mod tracking;

pub use backend::{FfmpegBackend, VideoBackend};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use extract::{extract_frames, frames_dir_for, resolve_indices, FrameSelection};
pub use frame::Frame;
pub use probe::{probe_video, VideoInfo};
pub use sink::{FfmpegFrameSink, FrameSink};
pub use source::{FfmpegFrameSource, FrameSource, MemoryFrameSource};
pub use tracking::{
    default_person_detector, PersonBox, PersonDetector, RenderProgress, StabilizeConfig,
    StabilizeReport, Stabilizer, TrackingStrategy,
};
