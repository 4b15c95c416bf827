//! Agglomerative clustering environment.
//!
//! A small deterministic domain shaped like the workloads the planner is
//! built for: a set of weighted points is merged pairwise until one
//! cluster remains, paying a merge cost at every step. Episodes are fully
//! replayable from snapshots, rewards are negative log-likelihood-scale
//! costs, and the action set shrinks as the episode progresses.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use arbor_core::{ArborError, Environment, Result, StepOutcome};

/// A weighted point in the plane.
#[derive(Clone, Debug, PartialEq)]
pub struct PointMass {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

/// Merge the clusters at positions `.0` and `.1` of the current cluster
/// list, with `.0 < .1`. Positions refer to the list as it stands now,
/// shifting down after every merge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct MergePair(pub u8, pub u8);

impl fmt::Display for MergePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Seeded 2-D agglomerative clustering environment.
///
/// Each step merges one pair of clusters into their weighted centroid and
/// pays the merge cost, the reduced mass of the pair times their squared
/// distance, as a negative reward. The episode ends once a single cluster
/// remains. Supports up to 255 initial points.
#[derive(Clone, Debug)]
pub struct ClusterEnv {
    rng: ChaCha8Rng,
    n_initial: usize,
    clusters: Vec<PointMass>,
}

impl ClusterEnv {
    /// Create an environment with `n` points drawn from `seed`.
    pub fn new(seed: u64, n: usize) -> Self {
        debug_assert!(n <= u8::MAX as usize);
        let mut env = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            n_initial: n,
            clusters: Vec::new(),
        };
        env.sample_clusters();
        env
    }

    fn sample_clusters(&mut self) {
        self.clusters = (0..self.n_initial)
            .map(|_| {
                let x: f64 = self.rng.sample(StandardNormal);
                let y: f64 = self.rng.sample(StandardNormal);
                PointMass {
                    x,
                    y,
                    weight: self.rng.gen_range(0.5..1.5),
                }
            })
            .collect();
    }

    /// Clusters still alive.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Cost of merging the clusters at positions `i` and `j`.
    fn merge_cost(&self, i: usize, j: usize) -> f64 {
        let a = &self.clusters[i];
        let b = &self.clusters[j];
        let d2 = (a.x - b.x).powi(2) + (a.y - b.y).powi(2);
        a.weight * b.weight / (a.weight + b.weight) * d2
    }
}

impl Environment for ClusterEnv {
    type Action = MergePair;
    type Snapshot = Vec<PointMass>;

    fn observe(&self) -> Vec<f64> {
        self.clusters
            .iter()
            .flat_map(|c| [c.weight, c.x, c.y])
            .collect()
    }

    fn legal_actions(&self) -> Vec<MergePair> {
        let n = self.clusters.len();
        let mut actions = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                actions.push(MergePair(i as u8, j as u8));
            }
        }
        actions
    }

    fn step(&mut self, action: MergePair) -> Result<StepOutcome> {
        let (i, j) = (action.0 as usize, action.1 as usize);
        if i >= j || j >= self.clusters.len() {
            return Err(ArborError::IllegalAction(format!(
                "{} with {} clusters",
                action,
                self.clusters.len()
            )));
        }

        let reward = -self.merge_cost(i, j);
        let b = self.clusters.remove(j);
        let a = &mut self.clusters[i];
        let weight = a.weight + b.weight;
        a.x = (a.x * a.weight + b.x * b.weight) / weight;
        a.y = (a.y * a.weight + b.y * b.weight) / weight;
        a.weight = weight;

        Ok(StepOutcome {
            reward,
            terminal: self.clusters.len() <= 1,
        })
    }

    fn snapshot(&self) -> Vec<PointMass> {
        self.clusters.clone()
    }

    fn restore(&mut self, snapshot: &Vec<PointMass>) {
        self.clusters = snapshot.clone();
    }

    fn reset(&mut self) {
        self.sample_clusters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_points() {
        let a = ClusterEnv::new(42, 6);
        let b = ClusterEnv::new(42, 6);
        assert_eq!(a.observe(), b.observe());

        let c = ClusterEnv::new(43, 6);
        assert_ne!(a.observe(), c.observe());
    }

    #[test]
    fn test_legal_actions_enumerate_pairs() {
        let env = ClusterEnv::new(1, 4);
        let actions = env.legal_actions();
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[0], MergePair(0, 1));
        assert_eq!(actions[5], MergePair(2, 3));
        for MergePair(i, j) in actions {
            assert!(i < j);
        }
    }

    #[test]
    fn test_step_merges_and_conserves_weight() {
        let mut env = ClusterEnv::new(7, 5);
        let total: f64 = env.snapshot().iter().map(|c| c.weight).sum();

        let outcome = env.step(MergePair(1, 3)).unwrap();
        assert!(outcome.reward < 0.0);
        assert!(!outcome.terminal);
        assert_eq!(env.num_clusters(), 4);

        let after: f64 = env.snapshot().iter().map(|c| c.weight).sum();
        assert!((total - after).abs() < 1e-9);
    }

    #[test]
    fn test_step_rejects_bad_pairs() {
        let mut env = ClusterEnv::new(7, 3);
        assert!(env.step(MergePair(2, 1)).is_err());
        assert!(env.step(MergePair(1, 1)).is_err());
        assert!(env.step(MergePair(0, 3)).is_err());
        // Failed steps leave the state alone.
        assert_eq!(env.num_clusters(), 3);
    }

    #[test]
    fn test_episode_terminates_at_one_cluster() {
        let mut env = ClusterEnv::new(11, 3);
        assert!(!env.step(MergePair(0, 1)).unwrap().terminal);
        assert!(env.step(MergePair(0, 1)).unwrap().terminal);
        assert_eq!(env.num_clusters(), 1);
        assert!(env.legal_actions().is_empty());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut env = ClusterEnv::new(13, 5);
        let snapshot = env.snapshot();
        let obs = env.observe();

        env.step(MergePair(0, 1)).unwrap();
        env.step(MergePair(0, 2)).unwrap();
        assert_ne!(env.observe(), obs);

        env.restore(&snapshot);
        assert_eq!(env.observe(), obs);
        assert_eq!(env.num_clusters(), 5);
    }

    #[test]
    fn test_restored_state_replays_identically() {
        let mut env = ClusterEnv::new(17, 4);
        let snapshot = env.snapshot();

        let first = env.step(MergePair(1, 2)).unwrap();
        env.restore(&snapshot);
        let second = env.step(MergePair(1, 2)).unwrap();

        assert_eq!(first.reward, second.reward);
        assert_eq!(first.terminal, second.terminal);
    }

    #[test]
    fn test_reset_draws_fresh_points() {
        let mut env = ClusterEnv::new(19, 4);
        let before = env.observe();
        env.step(MergePair(0, 1)).unwrap();

        env.reset();
        assert_eq!(env.num_clusters(), 4);
        // The generator moves on; a reset episode is a new draw.
        assert_ne!(env.observe(), before);
    }
}
