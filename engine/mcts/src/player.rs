//! Move selection on top of [`MctsEngine`].
//!
//! [`MctsPlayer`] turns search results into a move. In self-play it samples
//! from the visit distribution mixed with Dirichlet noise and keeps the
//! subtree of the chosen move for the next decision. Otherwise it plays the
//! most likely move and starts every decision from an empty tree.

use engine_core::Game;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::config::MctsConfig;
use crate::evaluator::Evaluator;
use crate::search::{dirichlet_noise, sample_move, MctsEngine, SearchError};

/// Anything that can pick moves in a game: search players, scripted
/// opponents, humans behind a prompt.
pub trait Agent<G: Game> {
    /// Choose a move for the player to move in `state`.
    fn select_move(&mut self, state: &G) -> Result<G::Move, SearchError>;

    /// A move was just played by the other side.
    ///
    /// Not called for the agent's own moves.
    fn observe_move(&mut self, _mv: G::Move) {}

    /// Forget anything carried over from earlier positions.
    fn reset(&mut self) {}
}

/// A chosen move together with the search distribution behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision<M> {
    pub mv: M,
    /// Temperature-scaled visit distribution over the root children,
    /// without exploration noise.
    pub probabilities: Vec<(M, f32)>,
}

/// MCTS-driven player owning one engine.
pub struct MctsPlayer<G: Game, E> {
    engine: MctsEngine<G, E>,
    /// Random source for noise and sampling, separate from the engine's
    rng: ChaCha20Rng,
    self_play: bool,
}

impl<G: Game, E: Evaluator<G>> MctsPlayer<G, E> {
    pub fn new(evaluator: E, config: MctsConfig, seed: u64) -> Result<Self, SearchError> {
        let engine = MctsEngine::new(evaluator, config, seed)?;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(1);
        Ok(Self {
            engine,
            rng,
            self_play: false,
        })
    }

    /// Mode used by [`Agent::select_move`].
    pub fn with_self_play(mut self, self_play: bool) -> Self {
        self.self_play = self_play;
        self
    }

    pub fn is_self_play(&self) -> bool {
        self.self_play
    }

    pub fn engine(&self) -> &MctsEngine<G, E> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MctsEngine<G, E> {
        &mut self.engine
    }

    /// Search `state` and choose a move.
    ///
    /// The tree root must stand for `state`: in self-play that holds when
    /// every move of the game comes from this player; otherwise the tree is
    /// reset after each decision.
    pub fn decide_move(
        &mut self,
        state: &G,
        is_self_play: bool,
    ) -> Result<Decision<G::Move>, SearchError> {
        if state.is_terminal() {
            return Err(SearchError::NoLegalMoves);
        }

        let temperature = self.engine.config().temperature;
        let probabilities = self.engine.get_move_probabilities(state, temperature)?;

        let mv = if is_self_play {
            let noisy = self.add_exploration_noise(&probabilities)?;
            let mv = sample_move(&noisy, &mut self.rng).ok_or(SearchError::NoLegalMoves)?;
            self.engine.advance_root(mv);
            mv
        } else {
            let mv = most_likely(&probabilities).ok_or(SearchError::NoLegalMoves)?;
            self.engine.reset();
            mv
        };

        debug!(
            player = %state.current_player(),
            %mv,
            self_play = is_self_play,
            candidates = probabilities.len(),
            "Decided move"
        );

        Ok(Decision { mv, probabilities })
    }

    /// `(1 - epsilon) * p + epsilon * Dir(alpha)` over the candidate moves.
    fn add_exploration_noise(
        &mut self,
        probabilities: &[(G::Move, f32)],
    ) -> Result<Vec<(G::Move, f32)>, SearchError> {
        let epsilon = self.engine.config().dirichlet_epsilon;
        let alpha = self.engine.config().dirichlet_alpha;
        if epsilon <= 0.0 {
            return Ok(probabilities.to_vec());
        }

        let noise = dirichlet_noise(probabilities.len(), alpha, &mut self.rng)?;
        Ok(probabilities
            .iter()
            .zip(noise)
            .map(|(&(mv, p), n)| (mv, (1.0 - epsilon) * p + epsilon * n))
            .collect())
    }
}

impl<G: Game, E: Evaluator<G>> Agent<G> for MctsPlayer<G, E> {
    fn select_move(&mut self, state: &G) -> Result<G::Move, SearchError> {
        let self_play = self.self_play;
        self.decide_move(state, self_play).map(|decision| decision.mv)
    }

    fn observe_move(&mut self, mv: G::Move) {
        // Evaluation play starts each decision from an empty tree
        if self.self_play {
            self.engine.advance_root(mv);
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
    }
}

/// Highest-probability move; ties go to the first in order.
fn most_likely<M: Copy>(probabilities: &[(M, f32)]) -> Option<M> {
    let mut best: Option<(M, f32)> = None;
    for &(mv, p) in probabilities {
        if best.map_or(true, |(_, top)| p > top) {
            best = Some((mv, p));
        }
    }
    best.map(|(mv, _)| mv)
}
