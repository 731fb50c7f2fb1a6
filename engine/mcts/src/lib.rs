//! Monte Carlo Tree Search (MCTS) with PUCT selection for two-player games.
//!
//! This crate provides a game-agnostic search that works with any game
//! implementing the `engine-core` [`Game`](engine_core::Game) trait.
//!
//! # Overview
//!
//! MCTS builds a search tree by running simulations. Each simulation
//! consists of four phases:
//!
//! 1. **Selection**: Traverse the tree with PUCT to balance exploration and
//!    exploitation
//! 2. **Expansion**: At a leaf, add a child for each legal move with the
//!    evaluator's prior
//! 3. **Evaluation**: Score the leaf with an evaluator (random rollout or an
//!    external policy-value estimator), or exactly when the game is over
//! 4. **Backpropagation**: Update visit counts and values along the path
//!    from leaf to root, flipping the sign at every ply
//!
//! Node values are stored from the perspective of the player who moved into
//! the node, so selection maximizes `Q + c_puct * P * sqrt(N_parent) / (1 + N)`
//! without negation.
//!
//! # Usage
//!
//! ```rust
//! use games_gomoku::Board;
//! use mcts::{MctsConfig, MctsPlayer, RandomRolloutEvaluator};
//!
//! let board = Board::tictactoe();
//! let config = MctsConfig::for_testing();
//! let mut player = MctsPlayer::new(RandomRolloutEvaluator::default(), config, 42).unwrap();
//!
//! let decision = player.decide_move(&board, false).unwrap();
//! println!("Best move: {}", decision.mv);
//! println!("Probabilities: {:?}", decision.probabilities);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `num_simulations`: Number of simulations per search (default: 400)
//! - `c_puct`: Exploration constant for PUCT (default: 5.0)
//! - `temperature`: Temperature for move probabilities (1.0 = proportional)
//! - `dirichlet_alpha` / `dirichlet_epsilon`: Self-play exploration noise
//!
//! # Evaluators
//!
//! - [`RandomRolloutEvaluator`]: Uniform priors, value from a random playout
//! - [`GuidedEvaluator`]: Wraps any [`PolicyValueFn`], e.g. a trained model
//!   or [`UniformPolicy`]
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                         MctsPlayer                          |
//! |      decide_move: noise + sampling / argmax, tree reuse     |
//! +-------------------------------------------------------------+
//! |                         MctsEngine                          |
//! |  +-------------+  +-------------+  +---------------------+  |
//! |  | SearchTree  |  |  Game state |  |     Evaluator       |  |
//! |  |  (arena)    |  |  (clones)   |  | (priors / value)    |  |
//! |  +------+------+  +------+------+  +----------+----------+  |
//! |         |                |                    |             |
//! |         v                v                    v             |
//! |  +-------------------------------------------------------+  |
//! |  |     select -> expand -> evaluate -> backpropagate     |  |
//! |  +-------------------------------------------------------+  |
//! +-------------------------------------------------------------+
//! ```

pub mod config;
pub mod evaluator;
pub mod node;
pub mod player;
pub mod search;
pub mod tree;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{ConfigError, MctsConfig};
pub use evaluator::{
    Evaluation, Evaluator, EvaluatorError, GuidedEvaluator, PolicyValueFn,
    RandomRolloutEvaluator, UniformPolicy,
};
pub use node::{NodeId, SearchNode};
pub use player::{Agent, Decision, MctsPlayer};
pub use search::{MctsEngine, SearchError, SearchStats};
pub use tree::{SearchTree, TreeStats};
