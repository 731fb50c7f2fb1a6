//! Actor statistics tracking and persistence.
//!
//! This module provides statistics tracking for the actor, including:
//! - Episode counts and outcomes
//! - Search performance
//! - Replay buffer fill level
//!
//! Stats are written to a JSON file so runs can be inspected while they go.

use engine_core::Player;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Aggregated actor statistics.
#[derive(Debug)]
pub struct ActorStats {
    actor_id: String,
    /// Board description, e.g. "9x9/5"
    board: String,
    episodes_completed: u32,
    /// Moves played across all episodes
    total_moves: u64,
    player1_wins: u32,
    player2_wins: u32,
    ties: u32,
    /// Searches run and their total wall time
    searches: u64,
    search_time_us: u64,
    simulations: u64,
    buffer_positions: usize,
    start_time: Instant,
    stats_path: PathBuf,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub actor_id: String,
    pub board: String,
    pub episodes_completed: u32,
    pub total_moves: u64,
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub ties: u32,
    pub avg_episode_length: f64,
    pub episodes_per_second: f64,
    pub runtime_seconds: f64,
    pub avg_search_us: f64,
    pub avg_simulations_per_search: f64,
    pub buffer_positions: usize,
    pub timestamp: u64,
}

impl ActorStats {
    /// Create new stats tracker writing to `stats_path`.
    pub fn new(stats_path: impl Into<PathBuf>, actor_id: &str, board: &str) -> Self {
        let stats_path = stats_path.into();

        // Ensure data directory exists
        if let Some(parent) = stats_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create data directory: {}", e);
            }
        }

        Self {
            actor_id: actor_id.to_string(),
            board: board.to_string(),
            episodes_completed: 0,
            total_moves: 0,
            player1_wins: 0,
            player2_wins: 0,
            ties: 0,
            searches: 0,
            search_time_us: 0,
            simulations: 0,
            buffer_positions: 0,
            start_time: Instant::now(),
            stats_path,
        }
    }

    /// Record a completed episode.
    pub fn record_episode(&mut self, moves: u32, winner: Option<Player>) {
        self.episodes_completed += 1;
        self.total_moves += moves as u64;

        match winner {
            Some(Player::One) => self.player1_wins += 1,
            Some(Player::Two) => self.player2_wins += 1,
            None => self.ties += 1,
        }
    }

    /// Record the searches of one episode.
    pub fn record_searches(&mut self, searches: u32, simulations: u64, elapsed_us: u64) {
        self.searches += searches as u64;
        self.search_time_us += elapsed_us;
        self.simulations += simulations;
    }

    pub fn set_buffer_positions(&mut self, positions: usize) {
        self.buffer_positions = positions;
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let episodes = self.episodes_completed;
        let runtime = self.start_time.elapsed().as_secs_f64();

        let avg_episode_length = if episodes > 0 {
            self.total_moves as f64 / episodes as f64
        } else {
            0.0
        };

        let episodes_per_second = if runtime > 0.0 {
            episodes as f64 / runtime
        } else {
            0.0
        };

        let (avg_search_us, avg_simulations_per_search) = if self.searches > 0 {
            (
                self.search_time_us as f64 / self.searches as f64,
                self.simulations as f64 / self.searches as f64,
            )
        } else {
            (0.0, 0.0)
        };

        ActorStatsSnapshot {
            actor_id: self.actor_id.clone(),
            board: self.board.clone(),
            episodes_completed: episodes,
            total_moves: self.total_moves,
            player1_wins: self.player1_wins,
            player2_wins: self.player2_wins,
            ties: self.ties,
            avg_episode_length,
            episodes_per_second,
            runtime_seconds: runtime,
            avg_search_us,
            avg_simulations_per_search,
            buffer_positions: self.buffer_positions,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize actor stats: {}", e);
                return;
            }
        };

        // Write to temp file then rename (atomic on most filesystems)
        let temp_path = self.stats_path.with_extension("json.tmp");
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write actor stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote actor stats to {}", self.stats_path.display());
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}
