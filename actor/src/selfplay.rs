//! Self-play episode runner
//!
//! One [`MctsPlayer`] plays both sides of every game with exploration
//! noise and tree reuse. Each finished game becomes a list of
//! [`PositionRecord`]s whose outcomes are filled in from the perspective
//! of the side that was to move.

use anyhow::{Context, Result};
use engine_core::game_utils::{dense_probabilities, outcome_value};
use engine_core::{Game, Player};
use games_gomoku::Board;
use indicatif::{ProgressBar, ProgressStyle};
use mcts::{
    Agent, Evaluator, GuidedEvaluator, MctsPlayer, RandomRolloutEvaluator, SearchStats,
    UniformPolicy,
};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::config::{Config, EvaluatorKind};
use crate::replay::{EpisodeRecord, EpisodeWriter, PositionRecord, ReplayBuffer};
use crate::stats::ActorStats;

/// Aggregated search stats for an episode.
#[derive(Debug, Default)]
pub struct EpisodeStats {
    /// Number of searches performed
    pub search_count: u32,
    /// Total wall-clock time across all searches (microseconds)
    pub total_time_us: u64,
    pub simulations: u64,
    pub evaluations: u64,
    pub terminal_hits: u64,
}

impl EpisodeStats {
    /// Add stats from a single search.
    pub fn add(&mut self, stats: &SearchStats) {
        self.search_count += 1;
        self.total_time_us += stats.elapsed_us;
        self.simulations += stats.simulations as u64;
        self.evaluations += stats.evaluations as u64;
        self.terminal_hits += stats.terminal_hits as u64;
    }

    /// Log a summary of the episode stats.
    pub fn log_summary(&self, episode_num: u32) {
        if self.search_count == 0 || self.total_time_us == 0 {
            return;
        }

        let total_ms = self.total_time_us as f64 / 1000.0;
        let sims_per_sec = self.simulations as f64 / (self.total_time_us as f64 / 1e6);
        let terminal_pct = if self.simulations > 0 {
            self.terminal_hits as f64 / self.simulations as f64 * 100.0
        } else {
            0.0
        };

        info!(
            episode = episode_num,
            searches = self.search_count,
            total_ms = format!("{:.1}", total_ms),
            sims_per_sec = format!("{:.0}", sims_per_sec),
            evaluations = self.evaluations,
            terminal_pct = format!("{:.1}%", terminal_pct),
            "MCTS episode stats"
        );
    }
}

/// Result of one self-play game.
#[derive(Debug)]
pub struct SelfPlayGame {
    pub winner: Option<Player>,
    pub moves: Vec<usize>,
    pub positions: Vec<PositionRecord>,
    pub stats: EpisodeStats,
}

/// Play one game from `start` with `player` moving for both sides.
///
/// The player is reset before and after the game so no tree survives
/// across episodes.
pub fn play_game<E: Evaluator<Board>>(
    player: &mut MctsPlayer<Board, E>,
    start: &Board,
) -> Result<SelfPlayGame> {
    player.reset();

    let mut state = start.clone();
    let mut moves = Vec::new();
    let mut pending: Vec<(Vec<f32>, Vec<f32>, Player)> = Vec::new();
    let mut stats = EpisodeStats::default();

    while !state.is_terminal() {
        let decision = player
            .decide_move(&state, true)
            .with_context(|| format!("searching move {}", moves.len() + 1))?;
        stats.add(player.engine().last_stats());

        let probabilities = dense_probabilities(
            state.num_actions(),
            decision
                .probabilities
                .iter()
                .map(|&(mv, p)| (state.move_index(mv), p)),
        );
        pending.push((state.encode(), probabilities, state.current_player()));

        state = state
            .apply(decision.mv)
            .with_context(|| format!("applying move {}", decision.mv))?;
        moves.push(decision.mv);
    }

    player.reset();

    let winner = state.winner();
    let shape = start.encoded_shape();
    let positions = backfill_outcomes(pending, winner, shape);

    Ok(SelfPlayGame {
        winner,
        moves,
        positions,
        stats,
    })
}

/// Attach the final result to every recorded position, seen from the
/// side that was to move there.
pub fn backfill_outcomes(
    pending: Vec<(Vec<f32>, Vec<f32>, Player)>,
    winner: Option<Player>,
    shape: [usize; 3],
) -> Vec<PositionRecord> {
    pending
        .into_iter()
        .map(|(state, probabilities, player)| PositionRecord {
            state,
            shape,
            probabilities,
            player: player_number(player),
            outcome: outcome_value(winner, player),
        })
        .collect()
}

fn player_number(player: Player) -> u8 {
    player.index() as u8 + 1
}

/// Drives self-play episodes and feeds the replay buffer.
pub struct SelfPlayRunner<E: Evaluator<Board>> {
    config: Config,
    player: MctsPlayer<Board, E>,
    buffer: ReplayBuffer,
    stats: ActorStats,
    writer: Option<EpisodeWriter>,
}

impl<E: Evaluator<Board>> SelfPlayRunner<E> {
    pub fn new(config: Config, evaluator: E) -> Result<Self> {
        let player = MctsPlayer::new(evaluator, config.mcts_config(), config.seed)
            .context("creating self-play player")?
            .with_self_play(true);
        let board = format!(
            "{}x{}/{}",
            config.board_width, config.board_height, config.n_in_row
        );
        let stats = ActorStats::new(config.stats_path(), &config.actor_id, &board);
        let writer = if config.save_records {
            Some(EpisodeWriter::open(config.records_path())?)
        } else {
            None
        };

        Ok(Self {
            buffer: ReplayBuffer::new(config.buffer_size),
            config,
            player,
            stats,
            writer,
        })
    }

    /// Run the configured number of episodes.
    pub fn run(&mut self) -> Result<&ReplayBuffer> {
        let start = self.config.new_board()?;
        let episodes = self.config.episodes;

        info!(
            actor_id = %self.config.actor_id,
            episodes,
            board = %format!("{}x{}", start.width(), start.height()),
            n_in_row = start.n_in_row(),
            num_simulations = self.config.num_simulations,
            evaluator = %self.config.evaluator,
            "Starting self-play"
        );

        // Progress bar only when stderr is a TTY
        let progress = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            let pb = ProgressBar::new(episodes as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} episodes ({eta})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        for episode in 1..=episodes {
            let episode_start = Instant::now();
            let game = play_game(&mut self.player, &start)
                .with_context(|| format!("self-play episode {}", episode))?;
            let length = game.moves.len() as u32;

            let added = self.buffer.push_episode(&game.positions);
            self.stats.record_episode(length, game.winner);
            self.stats.record_searches(
                game.stats.search_count,
                game.stats.simulations,
                game.stats.total_time_us,
            );
            self.stats.set_buffer_positions(self.buffer.len());
            debug!(
                episode,
                added,
                buffer = self.buffer.len(),
                "Stored episode positions"
            );

            if let Some(writer) = self.writer.as_mut() {
                let record = EpisodeRecord {
                    episode_id: format!("{}-{}", self.config.actor_id, episode),
                    actor_id: self.config.actor_id.clone(),
                    winner: game.winner.map(player_number),
                    length,
                    moves: game.moves,
                    positions: game.positions,
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0),
                };
                writer.write(&record)?;
            }

            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            if self.config.log_interval > 0 && episode % self.config.log_interval == 0 {
                let winner = game
                    .winner
                    .map(|p| format!("player {}", p))
                    .unwrap_or_else(|| "tie".to_string());
                let log = || {
                    info!(
                        episode,
                        length,
                        winner = %winner,
                        secs = format!("{:.2}", episode_start.elapsed().as_secs_f64()),
                        buffer = self.buffer.len(),
                        "Completed episode"
                    );
                    game.stats.log_summary(episode);
                };
                // Suspend progress bar while logging to avoid visual glitches
                match progress {
                    Some(ref pb) => pb.suspend(log),
                    None => log(),
                }
                self.stats.write_stats();
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            info!(path = %writer.path().display(), "Saved episode records");
            let path = self.config.buffer_path();
            let saved = self.buffer.save(&path)?;
            info!(positions = saved, path = %path.display(), "Saved replay buffer");
        }
        self.stats.write_stats();

        let snapshot = self.stats.snapshot();
        info!(
            episodes = snapshot.episodes_completed,
            player1_wins = snapshot.player1_wins,
            player2_wins = snapshot.player2_wins,
            ties = snapshot.ties,
            avg_length = format!("{:.1}", snapshot.avg_episode_length),
            buffer = self.buffer.len(),
            capacity = self.buffer.capacity(),
            stats = %self.stats.stats_path().display(),
            "Self-play finished"
        );

        Ok(&self.buffer)
    }
}

/// Run self-play with the evaluator named in `config`.
pub fn run(config: &Config) -> Result<()> {
    match config.evaluator_kind()? {
        EvaluatorKind::Rollout => {
            let evaluator = RandomRolloutEvaluator::new(config.rollout_max_depth);
            SelfPlayRunner::new(config.clone(), evaluator)?.run()?;
        }
        EvaluatorKind::Uniform => {
            let evaluator = GuidedEvaluator::new(UniformPolicy);
            SelfPlayRunner::new(config.clone(), evaluator)?.run()?;
        }
    }
    Ok(())
}
