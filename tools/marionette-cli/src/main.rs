//! marionette - glTF scene inspector and headless player
//!
//! `inspect` prints the imported node hierarchy, meshes, skins and
//! animations. `play` loads a file in the background and runs the frame
//! tick against a recording backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marionette_engine::{Config, JointMatrixFormula};
use std::path::{Path, PathBuf};

mod inspect;
mod play;

#[derive(Parser)]
#[command(name = "marionette")]
#[command(about = "glTF scene inspector and animation player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contents of a glTF/GLB file
    Inspect {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load a glTF/GLB file and run its animation headlessly
    Play {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Number of frames to tick
        #[arg(short, long, default_value_t = 60)]
        frames: u32,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Joint matrix formula (world, world-inverse-bind, skeleton-relative)
        #[arg(long)]
        formula: Option<JointMatrixFormula>,

        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { input, config } => {
            let config = load_config(config.as_deref())?;
            inspect::run(&input, &config)?;
        }

        Commands::Play {
            input,
            frames,
            fps,
            formula,
            config,
        } => {
            if fps <= 0.0 {
                anyhow::bail!("--fps must be positive, got {}", fps);
            }
            let mut config = load_config(config.as_deref())?;
            if let Some(formula) = formula {
                config.animation.joint_matrix_formula = formula;
            }
            play::run(&input, config, frames, fps)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config: {:?}", path))
        }
        None => Ok(Config::default()),
    }
}
