//! Still-frame export for picking manual anchors.

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::{error, info};

use runstab_cli::{init_tracing, FramesArgs};
use runstab_media::{
    check_ffmpeg, check_ffprobe, extract_frames, frames_dir_for, resolve_indices,
    FfmpegFrameSource, FrameSource,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    let args = FramesArgs::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: FramesArgs) -> anyhow::Result<()> {
    let selection = match args.selection() {
        Ok(selection) => selection,
        Err(e) => FramesArgs::command()
            .error(ErrorKind::InvalidValue, e)
            .exit(),
    };

    check_ffmpeg()?;
    check_ffprobe()?;

    let mut source = FfmpegFrameSource::open(&args.input)
        .await
        .with_context(|| format!("opening {}", args.input.display()))?;
    let info = source.info().clone();
    info!(
        "Video: {}x{} @ {:.0}fps, {} frames",
        info.width, info.height, info.fps, info.frame_count
    );

    let indices = resolve_indices(&selection, info.frame_count);
    let out_dir = frames_dir_for(&args.input);
    let saved = extract_frames(&mut source, &indices, &out_dir)
        .await
        .with_context(|| format!("extracting frames into {}", out_dir.display()))?;

    println!("Frames written to {}/", out_dir.display());
    for (index, path) in &saved {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("  frame {:4} -> {}", index, name);
    }
    println!();
    println!("Pick the first and last frames showing the runner, read their x,y");
    println!("pixel positions, then run:");
    println!(
        "  runstab {} out.mp4 <start_frame> <sx> <sy> <end_frame> <ex> <ey>",
        args.input.display()
    );

    Ok(())
}
