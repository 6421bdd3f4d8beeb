use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, LevelFilter};

use lens_tracer::config::{self, Setup};

/// Renders a lens scene frame by frame into PNG files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Scene file in JSON; the built-in demo is used when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Frame rate the sensor motion is sampled at.
    #[arg(long, default_value_t = 24.0)]
    fps: f32,

    #[arg(long, default_value = "renders")]
    output: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(args.log_level)
        .init();

    if !(args.fps > 0.0) {
        return Err(anyhow!("--fps must be positive, got {}", args.fps));
    }

    let Setup { mut scene, motion, tracer } = match &args.scene {
        Some(path) => config::load(path).with_context(|| format!("loading scene {}", path.display()))?,
        None => {
            info!(target: "app", "No scene given, using the built-in demo");
            Setup::demo()
        }
    };

    fs::create_dir_all(&args.output).with_context(|| format!("creating {}", args.output.display()))?;

    for frame in 0..args.frames {
        let sensor = motion.pose_at(frame as f32 / args.fps);
        let snapshot = scene.snapshot();

        info!(target: "app", "Starting frame {} render...", frame);
        let start = Instant::now();
        let picture = tracer.scan(&sensor, &snapshot)?;
        info!(target: "app", "Finished rendering. Took {:?}", start.elapsed());

        let path = args.output.join(format!("frame_{frame:04}.png"));
        let image = picture.to_image().ok_or_else(|| anyhow!("picture size does not match its pixels"))?;
        image.save(&path).with_context(|| format!("writing {}", path.display()))?;
        info!(target: "app", "Wrote {}", path.display());
    }

    Ok(())
}
