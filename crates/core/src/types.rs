//! Planning domain types with enforced invariants.
//!
//! These types ensure critical invariants are maintained at the type level:
//! - Policy: probability distribution summing to 1.0
//! - RewardBounds: finite closed reward interval

use crate::{ArborError, Result};

/// Tolerance for policy sum validation.
const POLICY_SUM_TOLERANCE: f64 = 1e-5;

/// A probability distribution over candidate actions.
///
/// Invariant: All values are non-negative and sum to 1.0 (±1e-5).
///
/// # Example
/// ```
/// use arbor_core::Policy;
///
/// let policy = Policy::new(vec![0.3, 0.5, 0.2]).unwrap();
/// assert!((policy.sum() - 1.0).abs() < 1e-5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f64>);

impl Policy {
    /// Create a new policy from a probability distribution.
    ///
    /// # Errors
    /// Returns `ArborError::InvalidPolicy` if:
    /// - Any value is negative
    /// - Values don't sum to 1.0 (±1e-5)
    /// - Vector is empty
    pub fn new(probs: Vec<f64>) -> Result<Self> {
        if probs.is_empty() {
            return Err(ArborError::InvalidPolicy(
                "policy cannot be empty".to_string(),
            ));
        }

        if probs.iter().any(|&p| p < 0.0) {
            return Err(ArborError::InvalidPolicy(
                "policy contains negative values".to_string(),
            ));
        }

        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > POLICY_SUM_TOLERANCE {
            return Err(ArborError::InvalidPolicy(format!(
                "policy sum {} is not 1.0 (tolerance {})",
                sum, POLICY_SUM_TOLERANCE
            )));
        }

        Ok(Self(probs))
    }

    /// Create a policy from raw non-negative weights, normalizing them to
    /// sum to 1.0.
    ///
    /// # Errors
    /// Returns error if any weight is negative or all weights are zero.
    pub fn from_unnormalized(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(ArborError::InvalidPolicy(
                "policy cannot be empty".to_string(),
            ));
        }

        if weights.iter().any(|&w| w < 0.0) {
            return Err(ArborError::InvalidPolicy(
                "policy contains negative values".to_string(),
            ));
        }

        let sum: f64 = weights.iter().sum();
        if sum == 0.0 {
            return Err(ArborError::InvalidPolicy(
                "cannot normalize: all weights are zero".to_string(),
            ));
        }

        let normalized: Vec<f64> = weights.iter().map(|&w| w / sum).collect();
        Ok(Self(normalized))
    }

    /// Create a uniform policy over the given number of candidates.
    ///
    /// # Errors
    /// Returns error if num_candidates is zero.
    pub fn uniform(num_candidates: usize) -> Result<Self> {
        if num_candidates == 0 {
            return Err(ArborError::InvalidPolicy(
                "cannot create uniform policy with 0 candidates".to_string(),
            ));
        }

        let prob = 1.0 / num_candidates as f64;
        Ok(Self(vec![prob; num_candidates]))
    }

    /// Get the probability at the given index.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Get the number of candidates in this policy.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the policy is empty (should never be true for valid policies).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the sum of all probabilities (should be ~1.0).
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Get a reference to the underlying slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl std::ops::Index<usize> for Policy {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// A finite closed reward interval.
///
/// Invariant: both endpoints are finite and `min <= max`. The interval is
/// used to clamp reward aggregates so the exploitation and exploration
/// terms of the selection rule stay on comparable scales.
///
/// # Example
/// ```
/// use arbor_core::RewardBounds;
///
/// let bounds = RewardBounds::new(-10.0, 0.0).unwrap();
/// assert_eq!(bounds.clamp(-25.0), -10.0);
/// assert_eq!(bounds.clamp(-2.5), -2.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardBounds {
    min: f64,
    max: f64,
}

impl RewardBounds {
    /// Create new bounds.
    ///
    /// # Errors
    /// Returns `ArborError::InvalidBounds` if either endpoint is not finite
    /// or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ArborError::InvalidBounds(format!(
                "bounds ({}, {}) must be finite",
                min, max
            )));
        }
        if min > max {
            return Err(ArborError::InvalidBounds(format!(
                "min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower endpoint.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper endpoint.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp a reward into the interval.
    pub fn clamp(&self, reward: f64) -> f64 {
        reward.clamp(self.min, self.max)
    }
}

impl Default for RewardBounds {
    /// Spans [-200, 0], the operating range for log-likelihood-scale
    /// rewards.
    fn default() -> Self {
        Self {
            min: -200.0,
            max: 0.0,
        }
    }
}

impl std::fmt::Display for RewardBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
