//! Gomoku game implementation for the search engine
//!
//! Two players alternately place stones on an empty cell of a `width × height`
//! board. The first to line up `n_in_row` stones horizontally, vertically or
//! diagonally wins; a full board without a line is a tie. A 3×3 board with
//! `n_in_row = 3` is TicTacToe.
//!
//! # Board Layout
//!
//! Cells are stored in row-major order and a move is the cell index:
//! ```text
//! Row 0: [ 0][ 1][ 2]
//! Row 1: [ 3][ 4][ 5]
//! Row 2: [ 6][ 7][ 8]
//! ```
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_gomoku::Board;
//!
//! let board = Board::tictactoe();
//! let board = board.apply(4).unwrap();
//! assert_eq!(board.legal_moves().len(), 8);
//! ```

use std::fmt;

use engine_core::{Game, GameError, Player, StonePlanes};

/// Game status after the last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ongoing,
    Won(Player),
    Tie,
}

/// Gomoku board state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    n_in_row: usize,
    /// Cell owners, row-major
    cells: Vec<Option<Player>>,
    current_player: Player,
    last_move: Option<usize>,
    moves_played: usize,
    status: Status,
}

impl Board {
    /// Create an empty board. `Player::One` moves first.
    pub fn new(width: usize, height: usize, n_in_row: usize) -> Result<Self, GameError> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidBoard(format!(
                "board must have at least one cell, got {}x{}",
                width, height
            )));
        }
        if n_in_row == 0 || n_in_row > width.min(height) {
            return Err(GameError::InvalidBoard(format!(
                "n_in_row {} does not fit a {}x{} board",
                n_in_row, width, height
            )));
        }

        Ok(Self {
            width,
            height,
            n_in_row,
            cells: vec![None; width * height],
            current_player: Player::One,
            last_move: None,
            moves_played: 0,
            status: Status::Ongoing,
        })
    }

    /// 3×3 board, three in a row.
    pub fn tictactoe() -> Self {
        Self {
            width: 3,
            height: 3,
            n_in_row: 3,
            cells: vec![None; 9],
            current_player: Player::One,
            last_move: None,
            moves_played: 0,
            status: Status::Ongoing,
        }
    }

    /// Build a position by playing `moves` from the empty board.
    pub fn from_moves(
        width: usize,
        height: usize,
        n_in_row: usize,
        moves: &[usize],
    ) -> Result<Self, GameError> {
        moves
            .iter()
            .try_fold(Self::new(width, height, n_in_row)?, |board, &mv| {
                board.apply(mv)
            })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn n_in_row(&self) -> usize {
        self.n_in_row
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_move(&self) -> Option<usize> {
        self.last_move
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    /// Owner of a cell, `None` if empty or out of range.
    pub fn stone_at(&self, mv: usize) -> Option<Player> {
        self.cells.get(mv).copied().flatten()
    }

    /// Convert a move index to `(row, col)`.
    pub fn move_to_location(&self, mv: usize) -> (usize, usize) {
        (mv / self.width, mv % self.width)
    }

    /// Convert `(row, col)` to a move index, `None` if off the board.
    pub fn location_to_move(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    /// Whether the stone at `mv` completes a line of `n_in_row`.
    fn completes_line(&self, mv: usize) -> bool {
        let Some(player) = self.stone_at(mv) else {
            return false;
        };
        let (row, col) = self.move_to_location(mv);
        let (row, col) = (row as isize, col as isize);

        // Direction vectors: horizontal, vertical, diagonal \, diagonal /
        let directions: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        directions.iter().any(|&(dr, dc)| {
            let count = 1
                + self.count_direction(player, row, col, dr, dc)
                + self.count_direction(player, row, col, -dr, -dc);
            count >= self.n_in_row
        })
    }

    /// Count consecutive stones of `player` starting next to `(row, col)`.
    fn count_direction(
        &self,
        player: Player,
        row: isize,
        col: isize,
        dr: isize,
        dc: isize,
    ) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row + dr, col + dc);
        while r >= 0 && c >= 0 && (r as usize) < self.height && (c as usize) < self.width {
            if self.cells[r as usize * self.width + c as usize] != Some(player) {
                break;
            }
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

impl Game for Board {
    type Move = usize;

    fn legal_moves(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }

        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.is_none().then_some(i))
            .collect()
    }

    fn apply(&self, mv: usize) -> Result<Self, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        match self.cells.get(mv) {
            None => {
                return Err(GameError::IllegalMove(format!(
                    "move {} is off a {}x{} board",
                    mv, self.width, self.height
                )))
            }
            Some(Some(owner)) => {
                return Err(GameError::IllegalMove(format!(
                    "cell {} is already taken by player {}",
                    mv, owner
                )))
            }
            Some(None) => {}
        }

        let mut next = self.clone();
        next.cells[mv] = Some(self.current_player);
        next.last_move = Some(mv);
        next.moves_played += 1;

        next.status = if next.completes_line(mv) {
            Status::Won(self.current_player)
        } else if next.moves_played == next.cells.len() {
            Status::Tie
        } else {
            Status::Ongoing
        };

        // The side to move always alternates, so a won position reports the
        // loser as the player to move.
        next.current_player = !self.current_player;

        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.status != Status::Ongoing
    }

    fn winner(&self) -> Option<Player> {
        match self.status {
            Status::Won(player) => Some(player),
            Status::Ongoing | Status::Tie => None,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn num_actions(&self) -> usize {
        self.width * self.height
    }

    fn move_index(&self, mv: usize) -> usize {
        mv
    }

    fn encode(&self) -> Vec<f32> {
        StonePlanes::new(self.width, self.height).encode(
            &self.cells,
            self.current_player(),
            self.last_move,
        )
    }

    fn encoded_shape(&self) -> [usize; 3] {
        StonePlanes::new(self.width, self.height).shape()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            let line: String = (0..self.width)
                .map(|col| match self.cells[row * self.width + col] {
                    Some(Player::One) => 'X',
                    Some(Player::Two) => 'O',
                    None => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
