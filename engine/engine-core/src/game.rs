//! Typed game contract consumed by the search engine.
//!
//! A game exposes its rules through this trait and nothing else: the engine
//! never looks at board geometry, win conditions or how a state is encoded
//! for an evaluator. States are immutable values; `apply` returns a new state.

use std::fmt;
use std::hash::Hash;
use std::ops::Not;

use crate::game_utils::outcome_value;

/// One of the two sides of the game. `One` moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Self {
        !self
    }

    /// Zero-based index (0 for `One`, 1 for `Two`).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

/// Errors raised at the rules boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Game is already over")]
    GameOver,

    #[error("Invalid board: {0}")]
    InvalidBoard(String),
}

/// Rules of a two-player, perfect-information, zero-sum game.
///
/// # Contract
///
/// * `legal_moves` is non-empty unless `is_terminal` is true, and is always
///   returned in the same canonical order for the same position.
/// * `apply` is pure: the receiver is not modified. Moves outside
///   `legal_moves` are rejected with [`GameError::IllegalMove`].
/// * `winner` is only meaningful once `is_terminal` is true; `None` on a
///   terminal state means a tie.
/// * `encode` produces a tensor of `encoded_shape()` in row-major order. The
///   search engine never reads it; it exists for external evaluators.
pub trait Game: Clone + fmt::Debug + Send + Sync + 'static {
    /// Move type. Ordering defines the canonical enumeration order used for
    /// tie-breaking.
    type Move: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Legal moves in canonical order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Return the state reached by playing `mv`.
    fn apply(&self, mv: Self::Move) -> Result<Self, GameError>;

    /// Whether the game is over.
    fn is_terminal(&self) -> bool;

    /// Winner of a finished game, `None` for a tie or an unfinished game.
    fn winner(&self) -> Option<Player>;

    /// Side to move.
    fn current_player(&self) -> Player;

    /// Size of the dense action space (e.g. number of board cells).
    fn num_actions(&self) -> usize;

    /// Position of `mv` in the dense action space, `< num_actions()`.
    fn move_index(&self, mv: Self::Move) -> usize;

    /// Canonical multi-plane encoding for evaluators.
    fn encode(&self) -> Vec<f32>;

    /// Shape of [`Game::encode`] as `[planes, height, width]`.
    fn encoded_shape(&self) -> [usize; 3];

    /// Outcome of a finished game from the perspective of the side to move:
    /// `+1` win, `-1` loss, `0` tie. `None` while the game is still running.
    fn terminal_value(&self) -> Option<f32> {
        if self.is_terminal() {
            Some(outcome_value(self.winner(), self.current_player()))
        } else {
            None
        }
    }
}
