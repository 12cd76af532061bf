//! scenecut CLI Tool
//!
//! Command-line interface that splits a video into scenes and prints them.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use scenecut_core::Scene;
use scenecut_detect::{
    ContentDetector, DetectorConfig, FrameSource, SceneManager, ScoreWeights, VideoReader,
};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scenecut")]
#[command(about = "Content-aware scene cut detection for video files")]
#[command(version)]
struct Cli {
    /// Input video file path
    #[arg(short, long)]
    input: PathBuf,

    /// Score a frame must exceed to be considered a cut
    #[arg(long, default_value = "27.0")]
    threshold: f64,

    /// Minimum scene length in frames
    #[arg(long, default_value = "15")]
    min_scene_len: u64,

    /// Override the frame rate reported by the video
    #[arg(long)]
    fps: Option<f64>,

    /// Downscale factor for analysis (default: pick from frame width, 1 = off)
    #[arg(long)]
    downscale: Option<u32>,

    /// Hue, saturation, luminance and edge weights of the frame score
    #[arg(long, num_args = 4, value_names = ["HUE", "SAT", "LUM", "EDGES"])]
    weights: Option<Vec<f64>>,

    /// Report the whole video as one scene when no cuts are found
    #[arg(long)]
    start_in_scene: bool,

    /// Print the scene list as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let scenes = detect_scenes(&cli)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_scenes(&mut writer, &scenes, cli.json).context("Failed to write scene list")?;
    writer.flush()?;

    Ok(())
}

fn detect_scenes(cli: &Cli) -> Result<Vec<Scene>> {
    info!("Detecting scenes in {}", cli.input.display());

    let mut reader = VideoReader::open(&cli.input, cli.fps)
        .with_context(|| format!("Failed to open video {}", cli.input.display()))?;

    let (width, height) = reader.frame_size();
    info!(
        "Video info: {}x{} @ {:.3} fps, ~{} frames",
        width,
        height,
        reader.frame_rate(),
        reader.frame_count()
    );

    let weights = match cli.weights.as_deref() {
        Some(&[hue, sat, lum, edges]) => {
            ScoreWeights::new(hue, sat, lum, edges).context("Invalid score weights")?
        }
        _ => ScoreWeights::default(),
    };
    let config = DetectorConfig {
        threshold: cli.threshold,
        min_scene_len: cli.min_scene_len,
        weights,
        ..DetectorConfig::default()
    };

    let mut manager =
        SceneManager::new(ContentDetector::new(&config)).with_downscale(cli.downscale);
    manager
        .detect_scenes(&mut reader)
        .context("Scene detection failed")?;

    let scenes = manager.get_scene_list(cli.start_in_scene);
    info!("Found {} scenes", scenes.len());
    Ok(scenes)
}

/// Writes one `start  end` line per scene, or the whole list as pretty JSON
fn write_scenes<W: Write>(writer: &mut W, scenes: &[Scene], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, scenes)?;
        writeln!(writer)?;
    } else {
        for scene in scenes {
            writeln!(writer, "{}  {}", scene.start, scene.end)?;
        }
    }
    Ok(())
}
