//! Configuration for the actor binary
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use engine_config::{load_config, CentralConfig};
use engine_core::GameError;
use games_gomoku::Board;
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_actor_id() -> String {
    CENTRAL_CONFIG.actor.actor_id.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_log_interval() -> u32 {
    CENTRAL_CONFIG.actor.log_interval
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.common.seed
}

fn default_board_width() -> usize {
    CENTRAL_CONFIG.board.width
}

fn default_board_height() -> usize {
    CENTRAL_CONFIG.board.height
}

fn default_n_in_row() -> usize {
    CENTRAL_CONFIG.board.n_in_row
}

fn default_num_simulations() -> u32 {
    CENTRAL_CONFIG.mcts.num_simulations
}

fn default_c_puct() -> f32 {
    CENTRAL_CONFIG.mcts.c_puct as f32
}

fn default_temperature() -> f32 {
    CENTRAL_CONFIG.mcts.temperature as f32
}

fn default_dirichlet_alpha() -> f32 {
    CENTRAL_CONFIG.mcts.dirichlet_alpha as f32
}

fn default_dirichlet_weight() -> f32 {
    CENTRAL_CONFIG.mcts.dirichlet_weight as f32
}

fn default_rollout_max_depth() -> u32 {
    CENTRAL_CONFIG.mcts.rollout_max_depth
}

fn default_evaluator() -> String {
    CENTRAL_CONFIG.actor.evaluator.clone()
}

fn default_episodes() -> u32 {
    CENTRAL_CONFIG.actor.episodes
}

fn default_buffer_size() -> usize {
    CENTRAL_CONFIG.actor.buffer_size
}

fn default_eval_games() -> u32 {
    CENTRAL_CONFIG.actor.eval_games
}

fn default_pure_mcts_playout_num() -> u32 {
    CENTRAL_CONFIG.actor.pure_mcts_playout_num
}

/// What the actor does once started.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Play games against itself and collect training positions
    Selfplay,
    /// Pit the guided player against a pure-rollout player
    Evaluate,
}

/// Leaf evaluator backing the self-play search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// Random playouts to the end of the game
    Rollout,
    /// Uniform priors with a neutral value
    Uniform,
}

impl FromStr for EvaluatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rollout" => Ok(Self::Rollout),
            "uniform" => Ok(Self::Uniform),
            other => Err(anyhow!(
                "unknown evaluator '{}', expected 'rollout' or 'uniform'",
                other
            )),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Gomoku actor - MCTS self-play and evaluation runner")]
#[command(
    long_about = "Actor that plays Gomoku with Monte Carlo Tree Search, either against
itself to collect training positions or against a pure-rollout opponent to
measure strength.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Run mode
    #[arg(value_enum, default_value_t = Mode::Selfplay)]
    pub mode: Mode,

    /// Unique actor identifier
    #[arg(long, default_value_t = default_actor_id())]
    pub actor_id: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Log progress every N episodes (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u32,

    /// Directory for stats and episode records
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Base seed for every random source
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Board width
    #[arg(long, default_value_t = default_board_width())]
    pub board_width: usize,

    /// Board height
    #[arg(long, default_value_t = default_board_height())]
    pub board_height: usize,

    /// Stones in a row needed to win
    #[arg(long, default_value_t = default_n_in_row())]
    pub n_in_row: usize,

    /// Number of MCTS simulations per move
    #[arg(long, default_value_t = default_num_simulations())]
    pub num_simulations: u32,

    /// PUCT exploration constant
    #[arg(long, default_value_t = default_c_puct())]
    pub c_puct: f32,

    /// Temperature applied to visit counts when turning them into probabilities
    #[arg(long, default_value_t = default_temperature())]
    pub temperature: f32,

    /// Dirichlet concentration for self-play exploration noise
    #[arg(long, default_value_t = default_dirichlet_alpha())]
    pub dirichlet_alpha: f32,

    /// Share of Dirichlet noise mixed into self-play move probabilities
    #[arg(long, default_value_t = default_dirichlet_weight())]
    pub dirichlet_weight: f32,

    /// Maximum plies of a random rollout before it is scored as a tie
    #[arg(long, default_value_t = default_rollout_max_depth())]
    pub rollout_max_depth: u32,

    /// Leaf evaluator for self-play (rollout, uniform)
    #[arg(long, default_value_t = default_evaluator())]
    pub evaluator: String,

    /// Self-play episodes to run
    #[arg(long, default_value_t = default_episodes())]
    pub episodes: u32,

    /// Replay buffer capacity in positions
    #[arg(long, default_value_t = default_buffer_size())]
    pub buffer_size: usize,

    /// Games played in evaluation mode
    #[arg(long, default_value_t = default_eval_games())]
    pub eval_games: u32,

    /// Simulations per move for the pure-rollout opponent
    #[arg(long, default_value_t = default_pure_mcts_playout_num())]
    pub pure_mcts_playout_num: u32,

    /// Append every finished self-play episode to episodes.jsonl and save the
    /// replay buffer to replay_buffer.jsonl in the data directory
    #[arg(long)]
    pub save_records: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.actor_id.is_empty() {
            return Err(anyhow!("actor_id cannot be empty"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.new_board()
            .map_err(|e| anyhow!("invalid board configuration: {}", e))?;

        self.mcts_config()
            .validate()
            .map_err(|e| anyhow!("invalid MCTS configuration: {}", e))?;

        self.evaluator_kind()?;

        if self.episodes == 0 {
            return Err(anyhow!("episodes must be greater than 0"));
        }

        if self.buffer_size == 0 {
            return Err(anyhow!("buffer_size must be greater than 0"));
        }

        if self.eval_games == 0 {
            return Err(anyhow!("eval_games must be greater than 0"));
        }

        if self.pure_mcts_playout_num == 0 {
            return Err(anyhow!("pure_mcts_playout_num must be greater than 0"));
        }

        Ok(())
    }

    /// Search settings for the actor's own player.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig {
            num_simulations: self.num_simulations,
            c_puct: self.c_puct,
            temperature: self.temperature,
            dirichlet_alpha: self.dirichlet_alpha,
            dirichlet_epsilon: self.dirichlet_weight,
        }
    }

    /// Search settings for the pure-rollout opponent used in evaluation.
    pub fn opponent_mcts_config(&self) -> MctsConfig {
        MctsConfig::for_evaluation()
            .with_simulations(self.pure_mcts_playout_num)
            .with_c_puct(self.c_puct)
    }

    pub fn evaluator_kind(&self) -> Result<EvaluatorKind> {
        self.evaluator.parse()
    }

    /// Empty board of the configured size.
    pub fn new_board(&self) -> Result<Board, GameError> {
        Board::new(self.board_width, self.board_height, self.n_in_row)
    }

    pub fn stats_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("actor_stats.json")
    }

    pub fn records_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("episodes.jsonl")
    }

    pub fn buffer_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("replay_buffer.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            mode: Mode::Selfplay,
            actor_id: "actor".into(),
            log_level: "info".into(),
            log_interval: 1,
            data_dir: "./data".into(),
            seed: 42,
            board_width: 6,
            board_height: 6,
            n_in_row: 4,
            num_simulations: 100,
            c_puct: 5.0,
            temperature: 1.0,
            dirichlet_alpha: 0.3,
            dirichlet_weight: 0.25,
            rollout_max_depth: 1000,
            evaluator: "rollout".into(),
            episodes: 1,
            buffer_size: 1000,
            eval_games: 2,
            pure_mcts_playout_num: 100,
            save_records: false,
        }
    }

    #[test]
    fn validate_accepts_base_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_empty_actor_id() {
        let mut config = base_config();
        config.actor_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unwinnable_board() {
        let mut config = base_config();
        config.n_in_row = 7;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid board configuration"));
    }

    #[test]
    fn validate_rejects_zero_simulations() {
        let mut config = base_config();
        config.num_simulations = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid MCTS configuration"));
    }

    #[test]
    fn validate_rejects_noise_weight_above_one() {
        let mut config = base_config();
        config.dirichlet_weight = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_evaluator() {
        let mut config = base_config();
        config.evaluator = "network".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown evaluator"));
    }

    #[test]
    fn validate_rejects_zero_episodes() {
        let mut config = base_config();
        config.episodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn evaluator_kind_is_case_insensitive() {
        let mut config = base_config();
        config.evaluator = "Uniform".into();
        assert_eq!(config.evaluator_kind().unwrap(), EvaluatorKind::Uniform);
    }

    #[test]
    fn mcts_config_maps_noise_weight_to_epsilon() {
        let config = base_config();
        let mcts = config.mcts_config();
        assert_eq!(mcts.num_simulations, 100);
        assert!((mcts.dirichlet_epsilon - 0.25).abs() < f32::EPSILON);
        assert!((mcts.dirichlet_alpha - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn opponent_config_uses_pure_playout_count_without_noise() {
        let config = base_config();
        let opponent = config.opponent_mcts_config();
        assert_eq!(opponent.num_simulations, 100);
        assert_eq!(opponent.dirichlet_epsilon, 0.0);
    }

    #[test]
    fn output_paths_live_in_data_dir() {
        let config = base_config();
        assert_eq!(
            config.stats_path(),
            PathBuf::from("./data").join("actor_stats.json")
        );
        assert_eq!(
            config.records_path(),
            PathBuf::from("./data").join("episodes.jsonl")
        );
    }

    #[test]
    fn parses_evaluate_mode_from_cli() {
        let config = Config::try_parse_from(["actor", "evaluate", "--eval-games", "4"]).unwrap();
        assert_eq!(config.mode, Mode::Evaluate);
        assert_eq!(config.eval_games, 4);
    }
}
