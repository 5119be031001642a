//! Command-line arguments.
//!
//! Positional layout:
//!
//! ```text
//! runstab <input> [output] [start_frame start_x start_y end_frame end_x end_y]
//! runstab-frames <video> [n | frame frame ...]
//! ```

use chrono::{DateTime, TimeZone};
use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

use runstab_media::{FrameSelection, TrackingStrategy};
use runstab_models::ManualAnchors;

/// Values making up a manual anchor pair.
pub const ANCHOR_VALUES: usize = 6;

/// Positional argument errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("expected 0, 1, 6 or 7 values after the input, got {0}")]
    WrongCount(usize),

    #[error("anchor value {value:?} is not an integer")]
    NotAnInteger { value: String },

    #[error("frame count {0:?} is not a positive integer")]
    BadFrameCount(String),
}

/// Reframe a running video so the runner stays centered.
#[derive(Parser, Debug)]
#[command(name = "runstab", version, about)]
pub struct StabilizeArgs {
    /// Input video
    pub input: PathBuf,

    /// [OUTPUT] [START_FRAME START_X START_Y END_FRAME END_X END_Y]
    #[arg(value_name = "ARGS", allow_negative_numbers = true)]
    pub rest: Vec<String>,

    /// Keep decoded frames in memory instead of decoding the input twice
    #[arg(long)]
    pub cache_frames: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Export still frames for picking manual anchors.
#[derive(Parser, Debug)]
#[command(name = "runstab-frames", version, about)]
pub struct FramesArgs {
    /// Input video
    pub input: PathBuf,

    /// A frame count, or two or more frame indices
    #[arg(value_name = "FRAMES", allow_negative_numbers = true)]
    pub frames: Vec<String>,
}

/// `<input-without-extension>_YYMMDDHHMM.mp4`
pub fn default_output_path<Tz: TimeZone>(input: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let mut path = input.with_extension("").into_os_string();
    path.push(format!("_{}.mp4", now.format("%y%m%d%H%M")));
    PathBuf::from(path)
}

fn parse_anchors(values: &[String]) -> Result<ManualAnchors, ArgsError> {
    let numbers = values
        .iter()
        .map(|v| {
            v.parse::<i64>().map_err(|_| ArgsError::NotAnInteger {
                value: v.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    ManualAnchors::from_values(&numbers).map_err(|_| ArgsError::WrongCount(values.len()))
}

impl StabilizeArgs {
    /// Resolve the output path and tracking strategy from the trailing values.
    pub fn resolve<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<(PathBuf, TrackingStrategy), ArgsError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let default_output = || default_output_path(&self.input, now);

        match self.rest.as_slice() {
            [] => Ok((default_output(), TrackingStrategy::Automatic)),
            [output] => Ok((PathBuf::from(output), TrackingStrategy::Automatic)),
            values if values.len() == ANCHOR_VALUES => Ok((
                default_output(),
                TrackingStrategy::Manual(parse_anchors(values)?),
            )),
            [output, values @ ..] if values.len() == ANCHOR_VALUES => Ok((
                PathBuf::from(output),
                TrackingStrategy::Manual(parse_anchors(values)?),
            )),
            values => Err(ArgsError::WrongCount(values.len())),
        }
    }
}

impl FramesArgs {
    /// Frames to export.
    pub fn selection(&self) -> Result<FrameSelection, ArgsError> {
        match self.frames.as_slice() {
            [] => Ok(FrameSelection::default()),
            [count] => count
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .map(FrameSelection::Evenly)
                .ok_or_else(|| ArgsError::BadFrameCount(count.clone())),
            values => values
                .iter()
                .map(|v| {
                    v.parse::<i64>()
                        .map(|i| i.max(0) as usize)
                        .map_err(|_| ArgsError::NotAnInteger { value: v.clone() })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FrameSelection::Indices),
        }
    }
}
