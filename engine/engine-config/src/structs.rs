//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_width() -> usize {
    defaults::board_width()
}
fn d_height() -> usize {
    defaults::board_height()
}
fn d_n_in_row() -> usize {
    defaults::n_in_row()
}
fn d_num_sims() -> u32 {
    defaults::num_simulations()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_temperature() -> f64 {
    defaults::temperature()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_weight() -> f64 {
    defaults::dirichlet_weight()
}
fn d_rollout_max_depth() -> u32 {
    defaults::rollout_max_depth()
}
fn d_actor_id() -> String {
    defaults::actor_id().into()
}
fn d_evaluator() -> String {
    defaults::evaluator().into()
}
fn d_episodes() -> u32 {
    defaults::episodes()
}
fn d_buffer_size() -> usize {
    defaults::buffer_size()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}
fn d_eval_games() -> u32 {
    defaults::eval_games()
}
fn d_pure_mcts_playout_num() -> u32 {
    defaults::pure_mcts_playout_num()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub actor: ActorConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
    /// Base seed for every random source
    #[serde(default = "d_seed")]
    pub seed: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
            seed: defaults::seed(),
        }
    }
}

/// Board geometry
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    #[serde(default = "d_width")]
    pub width: usize,
    #[serde(default = "d_height")]
    pub height: usize,
    #[serde(default = "d_n_in_row")]
    pub n_in_row: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: defaults::board_width(),
            height: defaults::board_height(),
            n_in_row: defaults::n_in_row(),
        }
    }
}

/// MCTS (Monte Carlo Tree Search) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_sims")]
    pub num_simulations: u32,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    /// Share of Dirichlet noise mixed into self-play move probabilities
    #[serde(default = "d_dirichlet_weight")]
    pub dirichlet_weight: f64,
    #[serde(default = "d_rollout_max_depth")]
    pub rollout_max_depth: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::num_simulations(),
            c_puct: defaults::c_puct(),
            temperature: defaults::temperature(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_weight: defaults::dirichlet_weight(),
            rollout_max_depth: defaults::rollout_max_depth(),
        }
    }
}

/// Actor (self-play and evaluation driver) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActorConfig {
    #[serde(default = "d_actor_id")]
    pub actor_id: String,
    /// Leaf evaluator used in self-play: "rollout" or "uniform"
    #[serde(default = "d_evaluator")]
    pub evaluator: String,
    #[serde(default = "d_episodes")]
    pub episodes: u32,
    /// Capacity of the in-memory replay buffer, in positions
    #[serde(default = "d_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
    #[serde(default = "d_eval_games")]
    pub eval_games: u32,
    /// Simulations per move for the pure-rollout opponent in evaluation
    #[serde(default = "d_pure_mcts_playout_num")]
    pub pure_mcts_playout_num: u32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            actor_id: defaults::actor_id().into(),
            evaluator: defaults::evaluator().into(),
            episodes: defaults::episodes(),
            buffer_size: defaults::buffer_size(),
            log_interval: defaults::log_interval(),
            eval_games: defaults::eval_games(),
            pure_mcts_playout_num: defaults::pure_mcts_playout_num(),
        }
    }
}
