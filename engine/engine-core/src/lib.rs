//! Core traits and types for the game engine
//!
//! This crate provides the rules contract the search engine is written against:
//! - `Game`: typed rules interface (legal moves, pure move application,
//!   terminal detection, evaluator encoding)
//! - `Player`: the two sides of a zero-sum game
//! - `StonePlanes`: shared multi-plane encoding for stone-placement boards
//! - `game_utils`: outcome conventions shared by games and search

pub mod board_game;
pub mod game;
pub mod game_utils;

// Re-export main types for convenience
pub use board_game::StonePlanes;
pub use game::{Game, GameError, Player};
