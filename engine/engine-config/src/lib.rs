//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across all Rust components (search engine settings, actor binary).
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`GOMOKU_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, embedded at compile time)
//!
//! Command-line flags of the actor binary sit above all of these.
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! GOMOKU_<SECTION>_<KEY>=value
//!
//! Examples:
//!     GOMOKU_COMMON_DATA_DIR=/data
//!     GOMOKU_BOARD_WIDTH=15
//!     GOMOKU_MCTS_NUM_SIMULATIONS=800
//!     GOMOKU_ACTOR_EVALUATOR=uniform
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, parse_config, CONFIG_PATH_ENV,
    CONFIG_SEARCH_PATHS,
};
pub use structs::*;
