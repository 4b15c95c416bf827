//! Planner configuration parameters.
//!
//! Everything is checked once, up front: a `PlannerConfig` that passes
//! `validate` never fails a parameter check mid-search.

use arbor_core::{ArborError, Result, RewardBounds};

/// How a node's backed-up returns are aggregated for selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Mean of backed-up returns (q / n).
    Mean,

    /// Maximum backed-up return (q_max).
    Max,
}

/// Planner configuration parameters.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// Target simulation passes per legal root action.
    pub n_mc_target: u32,

    /// Lower clamp on the per-decision pass budget.
    pub n_mc_min: u32,

    /// Upper clamp on the per-decision pass budget.
    pub n_mc_max: u32,

    /// Aggregation of backed-up returns in the selection rule.
    pub aggregation: Aggregation,

    /// Exploration constant of the selection rule.
    pub c_puct: f64,

    /// Interval reward aggregates are clamped into before selection.
    pub reward_bounds: RewardBounds,

    /// Frontier width for beam seeding.
    pub beam_width: usize,

    /// Maximum descent depth per simulation pass, greedy descent, or beam
    /// invocation.
    pub max_depth: usize,

    /// Seed the tree with a greedy descent before the simulation passes.
    pub seed_greedy: bool,

    /// Seed the tree with a beam search before the simulation passes.
    pub seed_beam: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            n_mc_target: 5,
            n_mc_min: 5,
            n_mc_max: 100,
            aggregation: Aggregation::Mean,
            c_puct: 1.0,
            reward_bounds: RewardBounds::default(),
            beam_width: 10,
            max_depth: 1000,
            seed_greedy: true,
            seed_beam: true,
        }
    }
}

impl PlannerConfig {
    /// Create a config that runs only the simulation passes, no seeding.
    pub fn mcts_only() -> Self {
        Self {
            seed_greedy: false,
            seed_beam: false,
            ..Default::default()
        }
    }

    /// Check every parameter.
    ///
    /// # Errors
    /// Returns `ArborError::InvalidConfig` naming the offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.n_mc_target == 0 {
            return Err(ArborError::InvalidConfig(
                "n_mc_target must be positive".to_string(),
            ));
        }
        if self.n_mc_min == 0 {
            return Err(ArborError::InvalidConfig(
                "n_mc_min must be positive".to_string(),
            ));
        }
        if self.n_mc_min > self.n_mc_max {
            return Err(ArborError::InvalidConfig(format!(
                "n_mc_min {} exceeds n_mc_max {}",
                self.n_mc_min, self.n_mc_max
            )));
        }
        if !self.c_puct.is_finite() || self.c_puct <= 0.0 {
            return Err(ArborError::InvalidConfig(format!(
                "c_puct {} must be finite and positive",
                self.c_puct
            )));
        }
        if self.beam_width == 0 {
            return Err(ArborError::InvalidConfig(
                "beam_width must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ArborError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
