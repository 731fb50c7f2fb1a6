//! Shared encoding for two-player stone-placement boards.
//!
//! Evaluators see a board as four `height × width` planes:
//!
//! 0. stones of the side to move
//! 1. stones of the opponent
//! 2. the last move played (single 1.0, all zeros before the first move)
//! 3. all ones when the side to move is the first player, else all zeros
//!
//! Planes are laid out plane-major, then row-major.

use crate::game::Player;

/// Number of planes produced by [`StonePlanes::encode`].
pub const NUM_PLANES: usize = 4;

/// Encoder for a rectangular board of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StonePlanes {
    pub width: usize,
    pub height: usize,
}

impl StonePlanes {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Cells per plane.
    #[inline]
    pub fn plane_size(&self) -> usize {
        self.width * self.height
    }

    /// Shape as `[planes, height, width]`.
    pub fn shape(&self) -> [usize; 3] {
        [NUM_PLANES, self.height, self.width]
    }

    /// Encode a board.
    ///
    /// - `cells`: row-major cell owners, `width * height` entries
    /// - `to_move`: side to move
    /// - `last_move`: index of the last stone placed, if any
    pub fn encode(
        &self,
        cells: &[Option<Player>],
        to_move: Player,
        last_move: Option<usize>,
    ) -> Vec<f32> {
        let size = self.plane_size();
        let mut planes = vec![0.0; NUM_PLANES * size];

        for (i, cell) in cells.iter().enumerate().take(size) {
            match cell {
                Some(owner) if *owner == to_move => planes[i] = 1.0,
                Some(_) => planes[size + i] = 1.0,
                None => {}
            }
        }

        if let Some(last) = last_move.filter(|&m| m < size) {
            planes[2 * size + last] = 1.0;
        }

        if to_move == Player::One {
            planes[3 * size..].fill(1.0);
        }

        planes
    }
}
