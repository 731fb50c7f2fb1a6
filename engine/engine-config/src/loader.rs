//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "GOMOKU_CONFIG";

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a crate directory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the GOMOKU_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_PATH_ENV, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// An unreadable or malformed file falls back to the built-in defaults with
/// a warning. Environment overrides are applied in every case.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Parse config.toml content without applying environment overrides.
/// Missing sections and keys take their built-in defaults.
pub fn parse_config(content: &str) -> Result<CentralConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, usize, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, raw),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: GOMOKU_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "GOMOKU_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "GOMOKU_COMMON_LOG_LEVEL");
    env_override!(config, common.seed, "GOMOKU_COMMON_SEED", parse);

    // Board
    env_override!(config, board.width, "GOMOKU_BOARD_WIDTH", parse);
    env_override!(config, board.height, "GOMOKU_BOARD_HEIGHT", parse);
    env_override!(config, board.n_in_row, "GOMOKU_BOARD_N_IN_ROW", parse);

    // MCTS
    env_override!(
        config,
        mcts.num_simulations,
        "GOMOKU_MCTS_NUM_SIMULATIONS",
        parse
    );
    env_override!(config, mcts.c_puct, "GOMOKU_MCTS_C_PUCT", parse);
    env_override!(config, mcts.temperature, "GOMOKU_MCTS_TEMPERATURE", parse);
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "GOMOKU_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_weight,
        "GOMOKU_MCTS_DIRICHLET_WEIGHT",
        parse
    );
    env_override!(
        config,
        mcts.rollout_max_depth,
        "GOMOKU_MCTS_ROLLOUT_MAX_DEPTH",
        parse
    );

    // Actor
    env_override!(config, actor.actor_id, "GOMOKU_ACTOR_ACTOR_ID");
    env_override!(config, actor.evaluator, "GOMOKU_ACTOR_EVALUATOR");
    env_override!(config, actor.episodes, "GOMOKU_ACTOR_EPISODES", parse);
    env_override!(config, actor.buffer_size, "GOMOKU_ACTOR_BUFFER_SIZE", parse);
    env_override!(
        config,
        actor.log_interval,
        "GOMOKU_ACTOR_LOG_INTERVAL",
        parse
    );
    env_override!(config, actor.eval_games, "GOMOKU_ACTOR_EVAL_GAMES", parse);
    env_override!(
        config,
        actor.pure_mcts_playout_num,
        "GOMOKU_ACTOR_PURE_MCTS_PLAYOUT_NUM",
        parse
    );

    config
}
