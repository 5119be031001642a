//! Treadmill-style reframing binary.

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::{error, info, warn};

use runstab_cli::{init_tracing, stabilize_config_from_env, StabilizeArgs};
use runstab_media::{
    check_ffmpeg, check_ffprobe, default_person_detector, FfmpegBackend, Stabilizer,
    TrackingStrategy,
};
use runstab_models::TrajectorySource;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    let args = StabilizeArgs::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: StabilizeArgs) -> anyhow::Result<()> {
    let (output, strategy) = match args.resolve(&chrono::Local::now()) {
        Ok(resolved) => resolved,
        Err(e) => StabilizeArgs::command()
            .error(ErrorKind::WrongNumberOfValues, e)
            .exit(),
    };

    let mut config = stabilize_config_from_env();
    if args.cache_frames {
        config.cache_frames = true;
    }

    check_ffmpeg()?;
    check_ffprobe()?;

    let backend = FfmpegBackend::new(config.encoding.clone());
    let mut stabilizer = Stabilizer::new(backend, config).context("invalid configuration")?;
    if strategy == TrackingStrategy::Automatic {
        let detector = default_person_detector().context("automatic tracking")?;
        stabilizer = stabilizer.with_detector(detector);
    }

    let report = stabilizer
        .run(&args.input, &output, strategy)
        .await
        .with_context(|| format!("stabilizing {}", args.input.display()))?;

    match &report.trajectory {
        TrajectorySource::Fitted { fit, inliers, .. } => {
            info!("Trajectory: {} ({} inliers)", fit, inliers)
        }
        TrajectorySource::Manual { anchors } => info!("Trajectory: manual {}", anchors),
        TrajectorySource::CenterFallback { .. } => info!("Trajectory: frame center"),
    }
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    info!(
        "Done: {} ({} frames, {}x{})",
        report.output.display(),
        report.render.frames_rendered,
        report.output_width,
        report.output_height
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
