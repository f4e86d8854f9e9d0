//! CLI entry point for kinect-replay.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kinect_replay::PlayerOptions;

/// Replay a multi-track Azure Kinect MKV recording
#[derive(Parser, Debug)]
#[command(name = "kinect-replay", version, about)]
struct Cli {
    /// The Kinect video filename (.mkv)
    video_filename: PathBuf,

    /// Drain frames as fast as possible instead of pacing to real time
    #[arg(long)]
    no_realtime_wait: bool,

    /// Skip the color stream
    #[arg(long)]
    no_rgb: bool,

    /// Skip the depth stream
    #[arg(long)]
    no_depth: bool,

    /// Skip the IR stream
    #[arg(long)]
    no_ir: bool,

    /// Minimum depth value to display (default: per-frame minimum)
    #[arg(long)]
    depth_min: Option<u16>,

    /// Maximum depth value to display (default: per-frame maximum)
    #[arg(long)]
    depth_max: Option<u16>,

    /// Minimum IR value to display (default: per-frame minimum)
    #[arg(long)]
    ir_min: Option<u16>,

    /// Maximum IR value to display (default: per-frame maximum)
    #[arg(long)]
    ir_max: Option<u16>,

    /// Save the combined view to this video file
    #[arg(long)]
    save_video: Option<PathBuf>,

    /// x264 preset used with --save-video
    #[arg(long, default_value = "medium")]
    encoding_preset: String,

    /// Display separate windows for the RGB, depth and IR images
    #[arg(long)]
    separate_windows: bool,

    /// Run without display windows (batch re-encoding)
    #[arg(long)]
    no_display: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinect_replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let options = PlayerOptions {
        realtime_wait: !cli.no_realtime_wait,
        rgb: !cli.no_rgb,
        depth: !cli.no_depth,
        ir: !cli.no_ir,
        depth_min: cli.depth_min,
        depth_max: cli.depth_max,
        ir_min: cli.ir_min,
        ir_max: cli.ir_max,
        save_video: cli.save_video,
        encoding_preset: cli.encoding_preset,
        separate_windows: cli.separate_windows,
        display: !cli.no_display,
    };

    kinect_replay::run(&cli.video_filename, &options)?;
    Ok(())
}
