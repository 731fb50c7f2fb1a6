//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time,
//! so the binary and the documented defaults can never drift apart.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    board: BoardDefaults,
    mcts: MctsDefaults,
    actor: ActorDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct BoardDefaults {
    width: usize,
    height: usize,
    n_in_row: usize,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_simulations: u32,
    c_puct: f64,
    temperature: f64,
    dirichlet_alpha: f64,
    dirichlet_weight: f64,
    rollout_max_depth: u32,
}

#[derive(Debug, Deserialize)]
struct ActorDefaults {
    actor_id: String,
    evaluator: String,
    episodes: u32,
    buffer_size: usize,
    log_interval: u32,
    eval_games: u32,
    pure_mcts_playout_num: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn seed() -> u64 {
    DEFAULTS.common.seed
}

// Board
pub fn board_width() -> usize {
    DEFAULTS.board.width
}
pub fn board_height() -> usize {
    DEFAULTS.board.height
}
pub fn n_in_row() -> usize {
    DEFAULTS.board.n_in_row
}

// MCTS
pub fn num_simulations() -> u32 {
    DEFAULTS.mcts.num_simulations
}
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn temperature() -> f64 {
    DEFAULTS.mcts.temperature
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn dirichlet_weight() -> f64 {
    DEFAULTS.mcts.dirichlet_weight
}
pub fn rollout_max_depth() -> u32 {
    DEFAULTS.mcts.rollout_max_depth
}

// Actor
pub fn actor_id() -> &'static str {
    &DEFAULTS.actor.actor_id
}
pub fn evaluator() -> &'static str {
    &DEFAULTS.actor.evaluator
}
pub fn episodes() -> u32 {
    DEFAULTS.actor.episodes
}
pub fn buffer_size() -> usize {
    DEFAULTS.actor.buffer_size
}
pub fn log_interval() -> u32 {
    DEFAULTS.actor.log_interval
}
pub fn eval_games() -> u32 {
    DEFAULTS.actor.eval_games
}
pub fn pure_mcts_playout_num() -> u32 {
    DEFAULTS.actor.pure_mcts_playout_num
}
