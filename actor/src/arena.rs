//! Head-to-head evaluation matches
//!
//! A candidate agent plays a series of games against an opponent, taking
//! the first move in every other game. The result is summarized as a win
//! ratio where ties count half.

use anyhow::{Context, Result};
use engine_core::{Game, Player};
use games_gomoku::Board;
use mcts::{
    Agent, GuidedEvaluator, MctsPlayer, RandomRolloutEvaluator, SearchError, UniformPolicy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Config;

/// Tally of a match from the candidate's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl MatchResult {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// `(wins + ties / 2) / games`, 0 before any game.
    pub fn win_ratio(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
    }

    fn record(&mut self, winner: Option<Player>, candidate: Player) {
        match winner {
            Some(p) if p == candidate => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.ties += 1,
        }
    }
}

/// Play one game from `start`. `first` moves for the side to move in
/// `start`, `second` for the other side. Returns the winner.
///
/// After every move the agent that did not make it is told about it.
pub fn play_match_game<G: Game>(
    start: &G,
    first: &mut dyn Agent<G>,
    second: &mut dyn Agent<G>,
) -> Result<Option<Player>, SearchError> {
    first.reset();
    second.reset();

    let first_player = start.current_player();
    let mut state = start.clone();
    while !state.is_terminal() {
        let (mover, other): (&mut dyn Agent<G>, &mut dyn Agent<G>) = if state.current_player() == first_player {
            (&mut *first, &mut *second)
        } else {
            (&mut *second, &mut *first)
        };
        let mv = mover.select_move(&state)?;
        state = state.apply(mv)?;
        other.observe_move(mv);
    }

    debug!(winner = ?state.winner(), "Match game finished");
    Ok(state.winner())
}

/// Play `games` games between `candidate` and `opponent`, alternating who
/// starts. The candidate moves first in the even-numbered games.
pub fn play_match<G: Game>(
    start: &G,
    candidate: &mut dyn Agent<G>,
    opponent: &mut dyn Agent<G>,
    games: u32,
) -> Result<MatchResult, SearchError> {
    let mut result = MatchResult::default();
    let first_player = start.current_player();

    for game in 0..games {
        let candidate_starts = game % 2 == 0;
        let (winner, candidate_side) = if candidate_starts {
            (play_match_game(start, candidate, opponent)?, first_player)
        } else {
            let winner = play_match_game(start, opponent, candidate)?;
            (winner, first_player.opponent())
        };
        result.record(winner, candidate_side);

        info!(
            game = game + 1,
            games,
            candidate_starts,
            outcome = match winner {
                Some(p) if p == candidate_side => "win",
                Some(_) => "loss",
                None => "tie",
            },
            "Evaluation game finished"
        );
    }

    Ok(result)
}

/// Pit uniform-prior MCTS against pure random-rollout MCTS on the
/// configured board and write the result to the data directory.
pub fn run(config: &Config) -> Result<MatchResult> {
    let start = config.new_board()?;

    let mut candidate = MctsPlayer::new(
        GuidedEvaluator::new(UniformPolicy),
        config.mcts_config(),
        config.seed,
    )
    .context("creating candidate player")?;
    let mut opponent = MctsPlayer::new(
        RandomRolloutEvaluator::new(config.rollout_max_depth),
        config.opponent_mcts_config(),
        config.seed.wrapping_add(1),
    )
    .context("creating rollout opponent")?;

    info!(
        games = config.eval_games,
        candidate_simulations = config.num_simulations,
        opponent_simulations = config.pure_mcts_playout_num,
        board = %format!("{}x{}/{}", start.width(), start.height(), start.n_in_row()),
        "Starting evaluation match"
    );

    let started = Instant::now();
    let result = play_match(&start, &mut candidate, &mut opponent, config.eval_games)
        .context("evaluation match")?;

    info!(
        wins = result.wins,
        losses = result.losses,
        ties = result.ties,
        win_ratio = format!("{:.3}", result.win_ratio()),
        secs = format!("{:.1}", started.elapsed().as_secs_f64()),
        "Evaluation finished"
    );

    write_result(config, &result)?;
    Ok(result)
}

fn write_result(config: &Config, result: &MatchResult) -> Result<()> {
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir))?;
    let path = std::path::Path::new(&config.data_dir).join("evaluation.json");
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), "Wrote evaluation result");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcts::MctsConfig;

    /// Always plays the lowest legal move.
    struct FirstLegal {
        resets: u32,
    }

    /// Records the moves it is told about.
    struct Listener<G: Game> {
        seen: Vec<G::Move>,
    }

    impl<G: Game> Agent<G> for Listener<G> {
        fn select_move(&mut self, state: &G) -> Result<G::Move, SearchError> {
            let moves = state.legal_moves();
            moves.last().copied().ok_or(SearchError::NoLegalMoves)
        }

        fn observe_move(&mut self, mv: G::Move) {
            self.seen.push(mv);
        }

        fn reset(&mut self) {
            self.seen.clear();
        }
    }

    impl<G: Game> Agent<G> for FirstLegal {
        fn select_move(&mut self, state: &G) -> Result<G::Move, SearchError> {
            state
                .legal_moves()
                .first()
                .copied()
                .ok_or(SearchError::NoLegalMoves)
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_win_ratio_counts_ties_half() {
        let result = MatchResult {
            wins: 2,
            losses: 1,
            ties: 1,
        };
        assert_eq!(result.games(), 4);
        assert!((result.win_ratio() - 0.625).abs() < 1e-12);
        assert_eq!(MatchResult::default().win_ratio(), 0.0);
    }

    #[test]
    fn test_first_mover_wins_with_scripted_play() {
        // X: 0, 2, 4, 6 completes the 2-4-6 diagonal on the seventh move
        let mut a = FirstLegal { resets: 0 };
        let mut b = FirstLegal { resets: 0 };
        let winner = play_match_game(&Board::tictactoe(), &mut a, &mut b).unwrap();
        assert_eq!(winner, Some(Player::One));
        assert_eq!(a.resets, 1);
        assert_eq!(b.resets, 1);
    }

    #[test]
    fn test_match_alternates_first_move() {
        let mut candidate = FirstLegal { resets: 0 };
        let mut opponent = FirstLegal { resets: 0 };
        let result = play_match(&Board::tictactoe(), &mut candidate, &mut opponent, 4).unwrap();

        assert_eq!(
            result,
            MatchResult {
                wins: 2,
                losses: 2,
                ties: 0
            }
        );
        assert!((result.win_ratio() - 0.5).abs() < 1e-12);
        assert_eq!(candidate.resets, 4);
    }

    #[test]
    fn test_search_beats_scripted_opponent() {
        let mut candidate = MctsPlayer::new(
            RandomRolloutEvaluator::default(),
            MctsConfig::for_evaluation().with_simulations(1000),
            9,
        )
        .unwrap();
        let mut opponent = FirstLegal { resets: 0 };

        let result = play_match(&Board::tictactoe(), &mut candidate, &mut opponent, 2).unwrap();
        assert_eq!(result.losses, 0);
    }

    #[test]
    fn test_agents_observe_only_opponent_moves() {
        // X plays the first free cell, O the last: X takes 0, 1, 2
        let mut x = FirstLegal { resets: 0 };
        let mut o = Listener::<Board> { seen: Vec::new() };
        let winner = play_match_game(&Board::tictactoe(), &mut x, &mut o).unwrap();

        assert_eq!(winner, Some(Player::One));
        assert_eq!(o.seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_self_play_search_player_completes_match() {
        let config = MctsConfig::default().with_simulations(200).with_dirichlet(0.3, 0.0);
        for seed in 0..4 {
            let mut candidate =
                MctsPlayer::new(RandomRolloutEvaluator::default(), config.clone(), seed)
                    .unwrap()
                    .with_self_play(true);
            let mut opponent = FirstLegal { resets: 0 };

            let result = play_match(&Board::tictactoe(), &mut candidate, &mut opponent, 2).unwrap();
            assert_eq!(result.games(), 2);
            assert_eq!(opponent.resets, 2);
        }
    }

    #[test]
    fn test_run_writes_evaluation_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            mode: crate::config::Mode::Evaluate,
            actor_id: "actor".into(),
            log_level: "info".into(),
            log_interval: 1,
            data_dir: dir.path().to_str().unwrap().into(),
            seed: 1,
            board_width: 3,
            board_height: 3,
            n_in_row: 3,
            num_simulations: 30,
            c_puct: 5.0,
            temperature: 1e-3,
            dirichlet_alpha: 0.3,
            dirichlet_weight: 0.0,
            rollout_max_depth: 100,
            evaluator: "rollout".into(),
            episodes: 1,
            buffer_size: 100,
            eval_games: 2,
            pure_mcts_playout_num: 30,
            save_records: false,
        };

        let result = run(&config).unwrap();
        assert_eq!(result.games(), 2);

        let content = fs::read_to_string(dir.path().join("evaluation.json")).unwrap();
        let parsed: MatchResult = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, result);
    }
}
