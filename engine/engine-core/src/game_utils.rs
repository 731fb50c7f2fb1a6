//! Shared utilities for two-player game implementations
//!
//! This module provides common functionality used across game implementations
//! and the search engine so that outcome conventions stay in one place.

use crate::game::Player;

/// Outcome of a finished two-player zero-sum game for `perspective`.
///
/// # Arguments
/// * `winner` - Winning side, `None` for a tie
/// * `perspective` - The side the value is reported for
///
/// # Returns
/// * `1.0` if `perspective` won
/// * `-1.0` if `perspective` lost
/// * `0.0` for ties
///
/// # Example
/// ```
/// use engine_core::game_utils::outcome_value;
/// use engine_core::Player;
///
/// assert_eq!(outcome_value(Some(Player::One), Player::One), 1.0);
/// assert_eq!(outcome_value(Some(Player::One), Player::Two), -1.0);
/// assert_eq!(outcome_value(None, Player::One), 0.0);
/// ```
#[inline]
pub fn outcome_value(winner: Option<Player>, perspective: Player) -> f32 {
    match winner {
        Some(player) if player == perspective => 1.0,
        Some(_) => -1.0,
        None => 0.0,
    }
}

/// Scatter sparse `(index, probability)` pairs into a dense vector.
///
/// Indices outside `0..len` are ignored. Used to turn search output into
/// fixed-size training targets.
pub fn dense_probabilities<I>(len: usize, entries: I) -> Vec<f32>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut dense = vec![0.0; len];
    for (index, p) in entries {
        if let Some(slot) = dense.get_mut(index) {
            *slot = p;
        }
    }
    dense
}
