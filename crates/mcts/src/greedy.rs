//! Greedy tree seeding.

use std::fmt::Debug;

use arbor_core::{Environment, Result};

use crate::config::PlannerConfig;
use crate::node::NodeId;
use crate::replay::{expand_node, PathReplayer};
use crate::tree::Tree;

/// Deterministic greedy descent.
///
/// Starting at the root, repeatedly expands the current node and follows
/// the child with the best immediate step reward until a terminal state
/// (or the depth cap), then backs up the realized return once. This
/// plants one good trajectory in the tree before the simulation passes
/// spend any budget.
pub struct GreedyExpander {
    max_depth: usize,
}

impl GreedyExpander {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    pub fn run<E: Environment>(
        &self,
        tree: &mut Tree<E::Action>,
        replayer: &mut PathReplayer<E>,
        real: &E,
        episode_reward: f64,
    ) -> Result<()> {
        log::debug!("starting greedy descent");

        let mut node = NodeId::ROOT;
        let mut total = 0.0;

        for _ in 0..self.max_depth {
            let path = tree.get(node).path.clone();
            let replay = replayer.replay(real, &path)?;
            total = replay.reward;
            tree.get_mut(node).set_terminal(replay.terminal);
            if replay.terminal {
                break;
            }

            expand_node(tree, replayer, node)?;
            if tree.get(node).terminal {
                // Zero legal actions here; nothing to descend into.
                break;
            }

            node = best_step_child(tree, node);
        }

        log::debug!("greedy descent backed up return {:.3}", episode_reward + total);
        tree.backup(node, episode_reward + total);
        Ok(())
    }
}

/// Child with the highest immediate step reward; ties go to the lowest
/// action identifier.
fn best_step_child<A: Copy + Ord + Debug>(tree: &Tree<A>, id: NodeId) -> NodeId {
    let mut best: Option<NodeId> = None;
    let mut best_q_step = f64::NEG_INFINITY;
    for &(_, child) in &tree.get(id).children {
        let q_step = tree.get(child).stats.q_step;
        if q_step > best_q_step {
            best_q_step = q_step;
            best = Some(child);
        }
    }
    best.expect("BUG: best_step_child on a node without children")
}
