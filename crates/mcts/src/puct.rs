//! PUCT action selection.

use std::fmt::Debug;

use arbor_core::{Policy, RewardBounds};

use crate::config::{Aggregation, PlannerConfig};
use crate::node::{NodeId, NodeStats};
use crate::tree::Tree;

/// The PUCT selection rule.
///
/// Each child is scored as
///
/// ```text
/// clamp(aggregate) + c_puct * p * sqrt(parent_n) / (1 + child_n)
/// ```
///
/// where the aggregate is the mean or max backed-up return per the
/// configured mode (the immediate step reward for unvisited children),
/// clamped into the reward bounds so the exploitation and exploration
/// terms stay on comparable scales. Ties go to the lowest action
/// identifier.
#[derive(Clone, Copy, Debug)]
pub struct PuctSelector {
    c_puct: f64,
    aggregation: Aggregation,
    bounds: RewardBounds,
}

impl PuctSelector {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            c_puct: config.c_puct,
            aggregation: config.aggregation,
            bounds: config.reward_bounds,
        }
    }

    /// Clamped exploitation term of one child.
    fn exploitation(&self, stats: &NodeStats) -> f64 {
        self.bounds.clamp(stats.aggregate(self.aggregation))
    }

    /// Select the child of `id` with the highest score under `policy`,
    /// whose probabilities are parallel to the stored child order.
    ///
    /// # Panics
    /// Panics if the node has no children.
    pub fn select<A: Copy + Ord + Debug>(
        &self,
        tree: &Tree<A>,
        id: NodeId,
        policy: &Policy,
    ) -> NodeId {
        let node = tree.get(id);
        debug_assert_eq!(policy.len(), node.children.len());

        let parent_n = node.stats.n as f64;
        let mut best: Option<NodeId> = None;
        let mut best_score = f64::NEG_INFINITY;

        for (i, &(_, child_id)) in node.children.iter().enumerate() {
            let stats = &tree.get(child_id).stats;
            let exploit = self.exploitation(stats);
            let explore = self.c_puct * policy[i] * parent_n.sqrt() / (1.0 + stats.n as f64);
            let score = exploit + explore;

            // Strict comparison keeps the first maximum; children are in
            // ascending action order, so ties go to the lowest action.
            if score > best_score {
                best_score = score;
                best = Some(child_id);
            }
        }

        best.expect("BUG: select called on a node without children")
    }
}
