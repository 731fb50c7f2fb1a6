//! Evaluator trait for position evaluation.
//!
//! An evaluator provides move priors and a value estimate for a non-terminal
//! state. Two strategies are provided:
//!
//! - [`RandomRolloutEvaluator`]: uniform priors, value from a random playout
//! - [`GuidedEvaluator`]: priors and value from an external estimator
//!   ([`PolicyValueFn`]), checked against the evaluator contract
//!
//! Values are always from the perspective of the player to move in the
//! evaluated state.

use std::collections::HashSet;

use engine_core::game_utils::outcome_value;
use engine_core::{Game, GameError};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::warn;

/// Allowed distance of a prior sum from 1.0.
pub const PRIOR_SUM_TOLERANCE: f32 = 1e-3;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluator contract violation: {0}")]
    ContractViolation(String),

    #[error("State is not terminal but has no legal moves")]
    DegenerateState,

    #[error("Rollout failed: {0}")]
    Game(#[from] GameError),
}

/// Result of evaluating a game state.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<M> {
    /// Prior for every legal move, summing to 1.
    pub priors: Vec<(M, f32)>,

    /// Value estimate for the player to move, in [-1, 1].
    pub value: f32,
}

/// Trait for position evaluators.
///
/// Implementations receive the engine's random source so that searches are
/// reproducible from a single seed.
pub trait Evaluator<G: Game>: Send + Sync {
    /// Evaluate a non-terminal game state.
    fn evaluate(
        &self,
        state: &G,
        rng: &mut ChaCha20Rng,
    ) -> Result<Evaluation<G::Move>, EvaluatorError>;
}

/// Equal prior for every move in `moves`.
pub fn uniform_priors<M: Copy>(moves: &[M]) -> Vec<(M, f32)> {
    if moves.is_empty() {
        return Vec::new();
    }
    let p = 1.0 / moves.len() as f32;
    moves.iter().map(|&mv| (mv, p)).collect()
}

/// Random rollout evaluator: uniform priors, value from a uniformly random
/// playout to the end of the game.
#[derive(Debug, Clone)]
pub struct RandomRolloutEvaluator {
    /// Maximum rollout depth; a playout still running after this many moves
    /// is scored as a tie.
    pub max_depth: u32,
}

impl Default for RandomRolloutEvaluator {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

impl RandomRolloutEvaluator {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// Play random legal moves on a private copy of `state` until the game
    /// ends. Returns +1 / -1 / 0 for the player to move in `state`.
    pub fn rollout<G: Game>(
        &self,
        state: &G,
        rng: &mut ChaCha20Rng,
    ) -> Result<f32, EvaluatorError> {
        let perspective = state.current_player();
        let mut state = state.clone();

        for _ in 0..self.max_depth {
            if state.is_terminal() {
                return Ok(outcome_value(state.winner(), perspective));
            }
            let moves = state.legal_moves();
            let mv = *moves.choose(rng).ok_or(EvaluatorError::DegenerateState)?;
            state = state.apply(mv)?;
        }

        if state.is_terminal() {
            return Ok(outcome_value(state.winner(), perspective));
        }

        warn!(
            max_depth = self.max_depth,
            "Rollout reached depth limit without a result, scoring as a tie"
        );
        Ok(0.0)
    }
}

impl<G: Game> Evaluator<G> for RandomRolloutEvaluator {
    fn evaluate(
        &self,
        state: &G,
        rng: &mut ChaCha20Rng,
    ) -> Result<Evaluation<G::Move>, EvaluatorError> {
        if let Some(value) = state.terminal_value() {
            return Ok(Evaluation {
                priors: Vec::new(),
                value,
            });
        }

        let moves = state.legal_moves();
        if moves.is_empty() {
            return Err(EvaluatorError::DegenerateState);
        }

        let value = self.rollout(state, rng)?;
        Ok(Evaluation {
            priors: uniform_priors(&moves),
            value,
        })
    }
}

/// External move/value estimator, e.g. a trained policy-value network.
///
/// Returns a prior for every legal move and a value for the player to move.
/// Any `Fn(&G) -> (Vec<(Move, f32)>, f32)` closure implements it.
pub trait PolicyValueFn<G: Game>: Send + Sync {
    fn policy_value(&self, state: &G) -> (Vec<(G::Move, f32)>, f32);
}

impl<G, F> PolicyValueFn<G> for F
where
    G: Game,
    F: Fn(&G) -> (Vec<(G::Move, f32)>, f32) + Send + Sync,
{
    fn policy_value(&self, state: &G) -> (Vec<(G::Move, f32)>, f32) {
        self(state)
    }
}

/// Uniform priors over the legal moves and a neutral value.
/// Stands in for a trained model before one exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPolicy;

impl<G: Game> PolicyValueFn<G> for UniformPolicy {
    fn policy_value(&self, state: &G) -> (Vec<(G::Move, f32)>, f32) {
        (uniform_priors(&state.legal_moves()), 0.0)
    }
}

/// Evaluator backed by an external [`PolicyValueFn`].
///
/// The estimator output is returned unchanged once it passes
/// [`check_evaluation`]. No rollout is performed.
#[derive(Debug, Clone, Default)]
pub struct GuidedEvaluator<P> {
    policy: P,
}

impl<P> GuidedEvaluator<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }
}

impl<G: Game, P: PolicyValueFn<G>> Evaluator<G> for GuidedEvaluator<P> {
    fn evaluate(
        &self,
        state: &G,
        _rng: &mut ChaCha20Rng,
    ) -> Result<Evaluation<G::Move>, EvaluatorError> {
        let (priors, value) = self.policy.policy_value(state);
        check_evaluation(state, &priors, value)?;
        Ok(Evaluation { priors, value })
    }
}

/// Check an estimator output against the evaluator contract: one
/// non-negative prior per legal move, priors summing to 1 within
/// [`PRIOR_SUM_TOLERANCE`], value in [-1, 1].
pub fn check_evaluation<G: Game>(
    state: &G,
    priors: &[(G::Move, f32)],
    value: f32,
) -> Result<(), EvaluatorError> {
    let violation = |msg: String| Err(EvaluatorError::ContractViolation(msg));

    if !(-1.0..=1.0).contains(&value) {
        return violation(format!("value {value} outside [-1, 1]"));
    }

    let legal: HashSet<G::Move> = state.legal_moves().into_iter().collect();
    let mut seen = HashSet::with_capacity(priors.len());
    let mut sum = 0.0;
    for &(mv, p) in priors {
        if !legal.contains(&mv) {
            return violation(format!("prior for illegal move {mv}"));
        }
        if !seen.insert(mv) {
            return violation(format!("duplicate prior for move {mv}"));
        }
        if !(p.is_finite() && p >= 0.0) {
            return violation(format!("invalid prior {p} for move {mv}"));
        }
        sum += p;
    }

    if seen.len() != legal.len() {
        return violation(format!(
            "priors cover {} of {} legal moves",
            seen.len(),
            legal.len()
        ));
    }
    if !legal.is_empty() && (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
        return violation(format!("priors sum to {sum}"));
    }

    Ok(())
}
