//! Policy evaluation abstraction.
//!
//! The `PolicyEvaluator` trait allows swapping between probability
//! sources: the bundled uniform and step-softmax evaluators here, or a
//! learned scorer supplied by the host.

use arbor_core::{ArborError, Environment, Policy, Result};

/// Scores candidate actions with selection probabilities.
///
/// `step_rewards` holds the immediate reward of each candidate, parallel
/// to `actions`; evaluators are free to ignore it. Implementations must
/// return one probability per candidate.
pub trait PolicyEvaluator<E: Environment> {
    /// Evaluate the candidates at the environment's current state.
    ///
    /// # Errors
    /// Returns `ArborError::InvalidPolicy` when no valid distribution can
    /// be produced, e.g. for an empty candidate list.
    fn evaluate(&self, env: &E, actions: &[E::Action], step_rewards: &[f64]) -> Result<Policy>;
}

/// Uniform probabilities over the candidates.
pub struct UniformPolicy;

impl<E: Environment> PolicyEvaluator<E> for UniformPolicy {
    fn evaluate(&self, _env: &E, actions: &[E::Action], _step_rewards: &[f64]) -> Result<Policy> {
        Policy::uniform(actions.len())
    }
}

/// Softmax over immediate step rewards, with a temperature.
///
/// A stand-in for a learned scorer: actions with better one-step rewards
/// get more probability, sharper as the temperature falls.
pub struct StepSoftmaxPolicy {
    temperature: f64,
}

impl StepSoftmaxPolicy {
    /// # Errors
    /// Returns `ArborError::InvalidConfig` if the temperature is not
    /// finite and positive.
    pub fn new(temperature: f64) -> Result<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ArborError::InvalidConfig(format!(
                "softmax temperature {} must be finite and positive",
                temperature
            )));
        }
        Ok(Self { temperature })
    }
}

impl<E: Environment> PolicyEvaluator<E> for StepSoftmaxPolicy {
    fn evaluate(&self, _env: &E, actions: &[E::Action], step_rewards: &[f64]) -> Result<Policy> {
        debug_assert_eq!(actions.len(), step_rewards.len());

        // Shift by the maximum before exponentiating; the weights stay in
        // (0, 1] and normalization never divides by zero.
        let max = step_rewards.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = step_rewards
            .iter()
            .map(|r| ((r - max) / self.temperature).exp())
            .collect();
        Policy::from_unnormalized(weights)
    }
}
