//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse the tree with PUCT until a leaf or a finished game
//! 2. Expansion: Add children to the leaf using the evaluator's priors
//! 3. Evaluation: Value from the evaluator, or the exact outcome at game end
//! 4. Backpropagation: Update statistics along the path, flipping sign per ply
//!
//! The engine owns its tree across calls so that a search can continue from
//! the subtree of the move actually played (see [`MctsEngine::advance_root`]).

use std::time::Instant;

use engine_core::{Game, GameError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ConfigError, MctsConfig};
use crate::evaluator::{Evaluator, EvaluatorError};
use crate::tree::{SearchTree, TreeStats};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Evaluator error: {0}")]
    Evaluator(EvaluatorError),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("State is not terminal but has no legal moves")]
    DegenerateState,

    #[error("Temperature must be finite and non-negative, got {0}")]
    InvalidTemperature(f32),

    #[error("Invalid MCTS config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl From<EvaluatorError> for SearchError {
    fn from(err: EvaluatorError) -> Self {
        match err {
            EvaluatorError::DegenerateState => SearchError::DegenerateState,
            other => SearchError::Evaluator(other),
        }
    }
}

/// Counters for the most recent [`MctsEngine::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Simulations performed
    pub simulations: u32,
    /// Leaves handed to the evaluator
    pub evaluations: u32,
    /// Simulations that ended on a finished game
    pub terminal_hits: u32,
    /// Wall time of the run in microseconds
    pub elapsed_us: u64,
}

/// PUCT tree search bound to one evaluator.
///
/// The tree persists between calls. Callers pass the position the current
/// root stands for; after a move is played either call
/// [`advance_root`](Self::advance_root) with it or [`reset`](Self::reset).
pub struct MctsEngine<G: Game, E> {
    tree: SearchTree<G::Move>,
    evaluator: E,
    config: MctsConfig,
    rng: ChaCha20Rng,
    last_stats: SearchStats,
}

impl<G: Game, E: Evaluator<G>> MctsEngine<G, E> {
    /// Create an engine with a fresh tree and a seeded random source.
    pub fn new(evaluator: E, config: MctsConfig, seed: u64) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            tree: SearchTree::new(),
            evaluator,
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            last_stats: SearchStats::default(),
        })
    }

    /// Run a single simulation (select -> expand -> evaluate -> backpropagate)
    /// on `state`, which must be a private copy of the root position.
    pub fn simulate(&mut self, mut state: G) -> Result<(), SearchError> {
        let mut node_id = self.tree.root();
        let mut depth = 0u32;

        // Selection
        while !state.is_terminal() {
            match self.tree.select_child(node_id, self.config.c_puct) {
                Some((mv, child_id)) => {
                    state = state.apply(mv)?;
                    node_id = child_id;
                    depth += 1;
                }
                None => break,
            }
        }

        // Expansion + evaluation
        let leaf_value = match state.terminal_value() {
            Some(value) => {
                self.last_stats.terminal_hits += 1;
                value
            }
            None => {
                let eval = self.evaluator.evaluate(&state, &mut self.rng)?;
                if eval.priors.is_empty() {
                    return Err(SearchError::DegenerateState);
                }
                self.last_stats.evaluations += 1;
                self.tree.expand(node_id, &eval.priors);
                eval.value
            }
        };

        // Backpropagation: the leaf stores the value for the player who
        // moved into it.
        self.tree.update_recursive(node_id, -leaf_value);
        self.last_stats.simulations += 1;

        trace!(
            leaf = node_id.0,
            depth,
            value = leaf_value,
            "MCTS simulation complete"
        );

        Ok(())
    }

    /// Run `n` simulations from `state`, each on its own clone.
    /// Does nothing if the game is already over.
    pub fn run(&mut self, state: &G, n: u32) -> Result<(), SearchError> {
        self.last_stats = SearchStats::default();
        if state.is_terminal() {
            debug!("Root position is terminal, skipping search");
            return Ok(());
        }

        let start = Instant::now();
        for _ in 0..n {
            self.simulate(state.clone())?;
        }
        self.last_stats.elapsed_us = start.elapsed().as_micros() as u64;

        let root = self.tree.get(self.tree.root());
        debug!(
            simulations = self.last_stats.simulations,
            evaluations = self.last_stats.evaluations,
            terminal_hits = self.last_stats.terminal_hits,
            root_visits = root.visit_count,
            tree_nodes = self.tree.node_count(),
            elapsed_us = self.last_stats.elapsed_us,
            "MCTS search complete"
        );

        Ok(())
    }

    /// Search for the configured number of simulations and return the most
    /// visited move, or `None` if the game is over.
    pub fn get_move(&mut self, state: &G) -> Result<Option<G::Move>, SearchError> {
        if state.is_terminal() {
            return Ok(None);
        }
        self.run(state, self.config.num_simulations)?;
        Ok(self.tree.best_move().map(|(mv, _)| mv))
    }

    /// Search for the configured number of simulations and return the
    /// temperature-scaled visit distribution over the root children.
    /// Empty if the game is over.
    pub fn get_move_probabilities(
        &mut self,
        state: &G,
        temperature: f32,
    ) -> Result<Vec<(G::Move, f32)>, SearchError> {
        if !(temperature.is_finite() && temperature >= 0.0) {
            return Err(SearchError::InvalidTemperature(temperature));
        }
        if state.is_terminal() {
            return Ok(Vec::new());
        }
        self.run(state, self.config.num_simulations)?;
        Ok(self.tree.root_policy(temperature))
    }

    /// Re-root the tree at the child reached by `mv`, keeping its
    /// statistics. Falls back to a fresh tree if `mv` was never expanded.
    /// Returns whether a subtree was reused.
    pub fn advance_root(&mut self, mv: G::Move) -> bool {
        let reused = self.tree.retain_subtree(mv);
        debug!(
            %mv,
            reused,
            tree_nodes = self.tree.node_count(),
            "Advanced search root"
        );
        reused
    }

    /// Discard the whole tree.
    pub fn reset(&mut self) {
        self.tree.reset();
    }

    /// Counters for the most recent search.
    pub fn last_stats(&self) -> &SearchStats {
        &self.last_stats
    }

    /// Shape statistics of the current tree.
    pub fn tree_stats(&self) -> TreeStats {
        self.tree.stats()
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &SearchTree<G::Move> {
        &self.tree
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }
}

/// Sample a move from a probability distribution.
/// Returns `None` only if every probability is zero.
pub fn sample_move<M: Copy>(probabilities: &[(M, f32)], rng: &mut ChaCha20Rng) -> Option<M> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for &(mv, p) in probabilities {
        cumsum += p;
        if r < cumsum {
            return Some(mv);
        }
    }

    // Fallback to last non-zero move (handles floating point issues)
    probabilities
        .iter()
        .rev()
        .find(|(_, p)| *p > 0.0)
        .map(|(mv, _)| *mv)
}

/// Generate Dirichlet-distributed noise using Gamma variates.
pub fn dirichlet_noise(
    n: usize,
    alpha: f32,
    rng: &mut ChaCha20Rng,
) -> Result<Vec<f32>, ConfigError> {
    use rand_distr::{Distribution, Gamma};

    let gamma =
        Gamma::new(alpha as f64, 1.0).map_err(|_| ConfigError::InvalidDirichletAlpha(alpha))?;
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    // Normalize; a tiny alpha can underflow every sample to zero
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    } else if n > 0 {
        samples.fill(1.0 / n as f32);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{GuidedEvaluator, RandomRolloutEvaluator, UniformPolicy};
    use crate::testing::StuckGame;
    use games_gomoku::Board;

    fn rollout_engine(sims: u32, seed: u64) -> MctsEngine<Board, RandomRolloutEvaluator> {
        let config = MctsConfig::for_testing().with_simulations(sims);
        MctsEngine::new(RandomRolloutEvaluator::default(), config, seed).unwrap()
    }

    /// X | X | _
    /// O | O | _
    /// _ | _ | _
    /// X to move, 2 wins.
    fn winning_position() -> Board {
        Board::from_moves(3, 3, 3, &[0, 3, 1, 4]).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MctsConfig::default().with_c_puct(-1.0);
        let result: Result<MctsEngine<Board, _>, _> =
            MctsEngine::new(RandomRolloutEvaluator::default(), config, 0);
        assert!(matches!(
            result,
            Err(SearchError::InvalidConfig(ConfigError::InvalidCPuct(_)))
        ));
    }

    #[test]
    fn test_root_visits_match_simulations() {
        let board = Board::tictactoe();
        let mut engine = rollout_engine(50, 42);

        engine.run(&board, 50).unwrap();
        assert_eq!(engine.tree().get(engine.tree().root()).visit_count, 50);
        assert_eq!(engine.last_stats().simulations, 50);
        assert_eq!(
            engine.last_stats().evaluations + engine.last_stats().terminal_hits,
            50
        );

        // The tree is kept between runs
        engine.run(&board, 10).unwrap();
        assert_eq!(engine.tree().get(engine.tree().root()).visit_count, 60);
    }

    #[test]
    fn test_run_leaves_state_untouched() {
        let board = Board::from_moves(5, 5, 4, &[12, 6]).unwrap();
        let before = board.clone();
        let mut engine = rollout_engine(100, 1);
        engine.run(&board, 100).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_tree_invariants_after_search() {
        let board = Board::new(4, 4, 3).unwrap();
        let mut engine = rollout_engine(300, 3);
        engine.run(&board, 300).unwrap();

        let tree = engine.tree();
        let legal = board.legal_moves();
        for node in tree.arena() {
            if node.visit_count == 0 {
                assert!(node.is_leaf());
            } else {
                let q = node.total_value / node.visit_count as f32;
                assert!((node.mean_value() - q).abs() < 1e-6);
            }
            if !node.is_leaf() {
                assert!(node.visit_count > 0);
            }
            // Child visits never exceed the parent's
            let child_visits: u32 = node
                .children
                .iter()
                .map(|(_, id)| tree.get(*id).visit_count)
                .sum();
            assert!(child_visits <= node.visit_count);
        }

        // Root children are exactly the legal moves, in canonical order
        let root_moves: Vec<usize> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|(mv, _)| *mv)
            .collect();
        assert_eq!(root_moves, legal);
    }

    #[test]
    fn test_move_probabilities_cover_root_children() {
        let board = Board::from_moves(3, 3, 3, &[4]).unwrap();
        let mut engine = rollout_engine(100, 7);

        let probs = engine.get_move_probabilities(&board, 1.0).unwrap();
        let moves: Vec<usize> = probs.iter().map(|(mv, _)| *mv).collect();
        assert_eq!(moves, board.legal_moves());

        let sum: f32 = probs.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|(_, p)| *p >= 0.0));

        // Proportional to visits at temperature 1
        let root_visits = engine.tree().root_visits();
        let total: u32 = root_visits.iter().map(|(_, n)| n).sum();
        for ((_, p), (_, n)) in probs.iter().zip(root_visits.iter()) {
            assert!((p - *n as f32 / total as f32).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_temperature_is_one_hot() {
        let board = Board::tictactoe();
        let mut engine = rollout_engine(200, 11);

        let probs = engine.get_move_probabilities(&board, 0.0).unwrap();
        let best = engine.tree().best_move().map(|(mv, _)| mv).unwrap();
        for (mv, p) in probs {
            if mv == best {
                assert_eq!(p, 1.0);
            } else {
                assert_eq!(p, 0.0);
            }
        }
    }

    #[test]
    fn test_negative_temperature_rejected() {
        let mut engine = rollout_engine(10, 0);
        let result = engine.get_move_probabilities(&Board::tictactoe(), -0.5);
        assert!(matches!(result, Err(SearchError::InvalidTemperature(_))));
        // Nothing was searched
        assert_eq!(engine.tree().node_count(), 1);
    }

    #[test]
    fn test_terminal_root_is_noop() {
        let won = Board::from_moves(3, 3, 3, &[0, 3, 1, 4, 2]).unwrap();
        let mut engine = rollout_engine(50, 0);

        engine.run(&won, 50).unwrap();
        assert_eq!(engine.tree().get(engine.tree().root()).visit_count, 0);
        assert_eq!(engine.get_move(&won).unwrap(), None);
        assert!(engine.get_move_probabilities(&won, 1.0).unwrap().is_empty());
        assert_eq!(engine.last_stats().simulations, 0);
    }

    #[test]
    fn test_degenerate_state_fails_fast() {
        let config = MctsConfig::for_testing();
        let mut rollout = MctsEngine::new(RandomRolloutEvaluator::default(), config.clone(), 0)
            .unwrap();
        assert!(matches!(
            rollout.run(&StuckGame, 5),
            Err(SearchError::DegenerateState)
        ));

        let mut guided = MctsEngine::new(GuidedEvaluator::new(UniformPolicy), config, 0).unwrap();
        assert!(matches!(
            guided.run(&StuckGame, 5),
            Err(SearchError::DegenerateState)
        ));
    }

    #[test]
    fn test_evaluator_contract_violation_propagates() {
        let bad = GuidedEvaluator::new(|state: &Board| -> (Vec<(usize, f32)>, f32) {
            let moves = state.legal_moves();
            (moves.iter().map(|&mv| (mv, 1.0)).collect(), 0.0)
        });
        let mut engine = MctsEngine::new(bad, MctsConfig::for_testing(), 0).unwrap();
        assert!(matches!(
            engine.get_move(&Board::tictactoe()),
            Err(SearchError::Evaluator(EvaluatorError::ContractViolation(_)))
        ));
    }

    #[test]
    fn test_finds_winning_move_with_rollouts() {
        let board = winning_position();
        let trials = 100;

        let mut found = 0;
        for seed in 0..trials {
            let config = MctsConfig::default().with_simulations(200);
            let mut engine =
                MctsEngine::new(RandomRolloutEvaluator::default(), config, seed).unwrap();
            if engine.get_move(&board).unwrap() == Some(2) {
                found += 1;
            }
        }

        assert!(
            found * 100 >= trials * 95,
            "winning move chosen in {found}/{trials} trials"
        );
    }

    #[test]
    fn test_finds_winning_move_with_uniform_policy() {
        let board = winning_position();
        let config = MctsConfig::default().with_simulations(400);
        let mut engine = MctsEngine::new(GuidedEvaluator::new(UniformPolicy), config, 42).unwrap();

        assert_eq!(engine.get_move(&board).unwrap(), Some(2));

        // Winning child is worth +1 to the player who plays it
        let child = engine.tree().child(engine.tree().root(), 2).unwrap();
        let node = engine.tree().get(child);
        assert!(node.visit_count > 0);
        assert!((node.mean_value() - 1.0).abs() < 1e-6);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_blocks_opponent_threat() {
        // X | _ | _
        // O | O | _
        // X | _ | _
        // X to move must block at 5.
        let board = Board::from_moves(3, 3, 3, &[0, 3, 6, 4]).unwrap();
        let config = MctsConfig::default().with_simulations(1000);
        let mut engine = MctsEngine::new(RandomRolloutEvaluator::default(), config, 5).unwrap();
        assert_eq!(engine.get_move(&board).unwrap(), Some(5));
    }

    #[test]
    fn test_advance_root_keeps_child_statistics() {
        let board = Board::tictactoe();
        let mut engine = rollout_engine(200, 9);
        engine.run(&board, 200).unwrap();

        let child_id = engine.tree().child(engine.tree().root(), 4).unwrap();
        let child = engine.tree().get(child_id).clone();
        assert!(child.visit_count > 0);

        assert!(engine.advance_root(4));
        let root = engine.tree().get(engine.tree().root());
        assert!(root.is_root());
        assert_eq!(root.visit_count, child.visit_count);
        assert!((root.mean_value() - child.mean_value()).abs() < 1e-6);
        assert_eq!(root.children.len(), child.children.len());

        // Searching on continues from the kept statistics
        let next = board.apply(4).unwrap();
        engine.run(&next, 20).unwrap();
        assert_eq!(
            engine.tree().get(engine.tree().root()).visit_count,
            child.visit_count + 20
        );
    }

    #[test]
    fn test_advance_root_unknown_move_resets() {
        let board = Board::tictactoe();
        let mut engine = rollout_engine(1, 9);
        // One simulation expands the root but visits no child
        engine.run(&board, 1).unwrap();
        assert_eq!(engine.tree().node_count(), 10);

        assert!(!engine.advance_root(42));
        assert_eq!(engine.tree().node_count(), 1);
        assert_eq!(engine.tree().get(engine.tree().root()).visit_count, 0);
    }

    #[test]
    fn test_same_seed_same_search() {
        let board = Board::new(5, 5, 4).unwrap();
        let mut a = rollout_engine(150, 123);
        let mut b = rollout_engine(150, 123);
        assert_eq!(
            a.get_move_probabilities(&board, 1.0).unwrap(),
            b.get_move_probabilities(&board, 1.0).unwrap()
        );
    }

    #[test]
    fn test_sample_move() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let probabilities = vec![(0usize, 0.0), (1, 0.5), (2, 0.3), (3, 0.2), (4, 0.0)];

        // Sample many times and check distribution
        let mut counts = [0u32; 5];
        for _ in 0..1000 {
            let mv = sample_move(&probabilities, &mut rng).unwrap();
            counts[mv] += 1;
        }

        // Moves 0 and 4 should never be selected
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);

        // Move 1 should be most common (~500), move 2 (~300), move 3 (~200)
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);

        assert_eq!(sample_move(&[(0usize, 0.0)], &mut rng), None);
        assert_eq!(sample_move::<usize>(&[], &mut rng), None);
    }

    #[test]
    fn test_dirichlet_noise() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let noise = dirichlet_noise(5, 0.3, &mut rng).unwrap();

        // Should sum to 1.0
        let sum: f32 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 0.01);

        // All values should be non-negative
        for &n in &noise {
            assert!(n >= 0.0);
        }

        assert!(dirichlet_noise(5, 0.0, &mut rng).is_err());
    }
}
