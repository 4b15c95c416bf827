//! Bounded-width beam seeding.

use std::cmp::Ordering;
use std::fmt::Debug;

use arbor_core::{Environment, Result};

use crate::config::PlannerConfig;
use crate::node::NodeId;
use crate::replay::{expand_node, PathReplayer};
use crate::tree::Tree;

/// Bounded-width, reward-greedy breadth-first tree seeding.
///
/// Carries a frontier of (cumulative reward, node) pairs between rounds.
/// Each round replays and expands the frontier nodes, pushes their most
/// promising untagged children, and keeps only the best `beam_width`
/// candidates. A node whose successors were already selected carries a
/// beam marker and is skipped, so repeated invocations within an episode
/// extend earlier work instead of redoing it.
pub struct BeamExpander {
    width: usize,
    max_depth: usize,
}

impl BeamExpander {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            width: config.beam_width,
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
        log::debug!("starting beam search with width {}", self.width);

        let mut beam: Vec<(f64, NodeId)> = vec![(episode_reward, NodeId::ROOT)];
        let mut next: Vec<(f64, NodeId)> = Vec::new();

        for _ in 0..self.max_depth {
            if beam.is_empty() {
                break;
            }

            for &(acc, id) in &beam {
                let path = tree.get(id).path.clone();
                let replay = replayer.replay(real, &path)?;
                tree.get_mut(id).set_terminal(replay.terminal);

                if !replay.terminal {
                    expand_node(tree, replayer, id)?;
                }
                if tree.get(id).terminal {
                    // A finished trajectory; bank its return and move on.
                    tree.backup(id, episode_reward + replay.reward);
                    continue;
                }

                let already = beamed_children(tree, id);
                if already >= self.width.min(tree.get(id).children.len()) {
                    continue;
                }

                for child in self.select_children(tree, id) {
                    let q_step = tree.get(child).stats.q_step;
                    next.push((acc + q_step, child));
                }
                tree.get_mut(id).in_beam = true;
            }

            next.sort_by(|x, y| frontier_order(tree, x, y));
            next.truncate(self.width);
            beam = std::mem::take(&mut next);
        }

        log::debug!("finished beam search");
        Ok(())
    }

    /// Up to `width` children of `id` not yet beam-tagged, best immediate
    /// step reward first, ties to the lowest action identifier.
    fn select_children<A: Copy + Ord + Debug>(&self, tree: &Tree<A>, id: NodeId) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = tree
            .get(id)
            .children
            .iter()
            .map(|&(_, c)| c)
            .filter(|&c| !tree.get(c).in_beam)
            .collect();

        candidates.sort_by(|&x, &y| {
            let qx = tree.get(x).stats.q_step;
            let qy = tree.get(y).stats.q_step;
            qy.partial_cmp(&qx)
                .unwrap_or(Ordering::Equal)
                .then_with(|| tree.get(x).action().cmp(&tree.get(y).action()))
        });
        candidates.truncate(self.width);
        candidates
    }
}

/// Children of `id` already selected as beam members.
fn beamed_children<A: Copy + Ord + Debug>(tree: &Tree<A>, id: NodeId) -> usize {
    tree.get(id)
        .children
        .iter()
        .filter(|&&(_, c)| tree.get(c).in_beam)
        .count()
}

/// Frontier retention order: cumulative reward descending, exact ties by
/// lexicographically smaller path.
fn frontier_order<A: Copy + Ord + Debug>(
    tree: &Tree<A>,
    x: &(f64, NodeId),
    y: &(f64, NodeId),
) -> Ordering {
    y.0.partial_cmp(&x.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| tree.get(x.1).path.cmp(&tree.get(y.1).path))
}
