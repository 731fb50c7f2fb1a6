//! Actor - Gomoku self-play and evaluation runner
//!
//! A batch process that either:
//! 1. Plays MCTS self-play games, keeping a replay buffer of training
//!    positions and optionally saving every game to `episodes.jsonl`
//! 2. Plays an evaluation match between uniform-prior MCTS and pure
//!    random-rollout MCTS and reports the win ratio
//!
//! Run statistics are written as JSON to the data directory.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod arena;
mod config;
mod replay;
mod selfplay;
mod stats;

use crate::config::{Config, Mode};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        actor_id = %config.actor_id,
        mode = ?config.mode,
        seed = config.seed,
        data_dir = %config.data_dir,
        "Actor starting"
    );

    let run_result = match config.mode {
        Mode::Selfplay => selfplay::run(&config),
        Mode::Evaluate => arena::run(&config).map(|result| {
            println!(
                "win ratio {:.3} ({} wins, {} losses, {} ties)",
                result.win_ratio(),
                result.wins,
                result.losses,
                result.ties
            );
        }),
    };

    match run_result {
        Ok(()) => {
            info!("Actor completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {:#}", e);
            Err(e)
        }
    }
}
