//! Small games for exercising edge cases of the search.

use engine_core::{Game, GameError, Player};

/// A position that is not over but offers no moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StuckGame;

impl Game for StuckGame {
    type Move = u8;

    fn legal_moves(&self) -> Vec<u8> {
        Vec::new()
    }

    fn apply(&self, mv: u8) -> Result<Self, GameError> {
        Err(GameError::IllegalMove(mv.to_string()))
    }

    fn is_terminal(&self) -> bool {
        false
    }

    fn winner(&self) -> Option<Player> {
        None
    }

    fn current_player(&self) -> Player {
        Player::One
    }

    fn num_actions(&self) -> usize {
        1
    }

    fn move_index(&self, mv: u8) -> usize {
        usize::from(mv)
    }

    fn encode(&self) -> Vec<f32> {
        Vec::new()
    }

    fn encoded_shape(&self) -> [usize; 3] {
        [0, 0, 0]
    }
}
