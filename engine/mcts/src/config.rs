//! MCTS configuration parameters.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_simulations must be at least 1")]
    NoSimulations,

    #[error("c_puct must be positive, got {0}")]
    InvalidCPuct(f32),

    #[error("temperature must be non-negative, got {0}")]
    InvalidTemperature(f32),

    #[error("dirichlet_epsilon must be in [0, 1], got {0}")]
    InvalidDirichletEpsilon(f32),

    #[error("dirichlet_alpha must be positive when noise is enabled, got {0}")]
    InvalidDirichletAlpha(f32),
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run per search.
    pub num_simulations: u32,

    /// Exploration constant for the PUCT formula.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub c_puct: f32,

    /// Temperature applied to visit counts when producing move probabilities.
    /// 1.0 = proportional to visits, values near 0.0 = argmax.
    pub temperature: f32,

    /// Dirichlet concentration for self-play exploration noise.
    pub dirichlet_alpha: f32,

    /// Fraction of the self-play move distribution taken from Dirichlet
    /// noise: `(1 - epsilon) * p + epsilon * noise`. 0.0 disables noise.
    pub dirichlet_epsilon: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 400,
            c_puct: 5.0,
            temperature: 1.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
        }
    }
}

impl MctsConfig {
    /// Create config for self-play training (with exploration noise).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for evaluation matches (no noise, near-greedy).
    pub fn for_evaluation() -> Self {
        Self {
            temperature: 1e-3,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.0,
            ..Self::default()
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            dirichlet_epsilon: 0.0,
            ..Self::default()
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set temperature.
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    /// Builder pattern: set Dirichlet noise parameters.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Check that every parameter is usable by the search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_simulations == 0 {
            return Err(ConfigError::NoSimulations);
        }
        if !(self.c_puct.is_finite() && self.c_puct > 0.0) {
            return Err(ConfigError::InvalidCPuct(self.c_puct));
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(ConfigError::InvalidDirichletEpsilon(self.dirichlet_epsilon));
        }
        if self.dirichlet_epsilon > 0.0
            && !(self.dirichlet_alpha.is_finite() && self.dirichlet_alpha > 0.0)
        {
            return Err(ConfigError::InvalidDirichletAlpha(self.dirichlet_alpha));
        }
        Ok(())
    }
}
