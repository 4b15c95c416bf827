//! Path replay against a private environment copy.
//!
//! The tree stores action paths, not environment states. To evaluate a
//! node, its path is replayed step by step on a private copy of the real
//! environment, which is resynchronized beforehand if the two have
//! diverged.

use arbor_core::{Environment, Result};

use crate::node::NodeId;
use crate::tree::Tree;

/// Relative tolerance of the divergence check.
const SYNC_RTOL: f64 = 1e-5;

/// Absolute tolerance of the divergence check.
const SYNC_ATOL: f64 = 1e-8;

/// Elementwise closeness of two observation vectors. Differing lengths
/// count as divergence.
fn observations_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= SYNC_ATOL + SYNC_RTOL * y.abs())
}

/// Result of replaying a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Replay {
    /// Cumulative reward along the replayed prefix.
    pub reward: f64,

    /// Whether the path hit a terminal state. Any remaining actions were
    /// skipped.
    pub terminal: bool,
}

/// Replays action paths on a private environment copy.
///
/// Only the private copy is ever mutated; the real environment is read for
/// synchronization and never stepped.
pub struct PathReplayer<E: Environment> {
    sim: E,
}

impl<E: Environment> PathReplayer<E> {
    /// Wrap a private environment copy.
    pub fn new(sim: E) -> Self {
        Self { sim }
    }

    /// The private copy, positioned wherever the last replay or probe left
    /// it.
    pub fn env(&self) -> &E {
        &self.sim
    }

    /// Legal actions from the private copy's current state.
    pub fn legal_actions(&self) -> Vec<E::Action> {
        self.sim.legal_actions()
    }

    /// Bring the private copy to the real environment's state, but only if
    /// their observations have diverged.
    fn sync(&mut self, real: &E) {
        if !observations_close(&self.sim.observe(), &real.observe()) {
            log::trace!("resyncing private copy to the real environment");
            self.sim.restore(&real.snapshot());
        }
    }

    /// Replay `path` from the real environment's current state.
    ///
    /// Replay stops early when a step reports terminal; the remaining
    /// actions are skipped and the result is flagged accordingly.
    ///
    /// # Errors
    /// An illegal action in the path propagates. It means the tree and the
    /// environment disagree about reachable states, which cannot be
    /// repaired here.
    pub fn replay(&mut self, real: &E, path: &[E::Action]) -> Result<Replay> {
        self.sync(real);

        let mut reward = 0.0;
        for &action in path {
            let outcome = self.sim.step(action)?;
            reward += outcome.reward;
            if outcome.terminal {
                return Ok(Replay {
                    reward,
                    terminal: true,
                });
            }
        }
        Ok(Replay {
            reward,
            terminal: false,
        })
    }

    /// Probe the immediate reward of each candidate action from the
    /// private copy's current state, restoring the state after every
    /// probe.
    pub fn peek_rewards(&mut self, actions: &[E::Action]) -> Result<Vec<f64>> {
        let snapshot = self.sim.snapshot();
        let mut rewards = Vec::with_capacity(actions.len());
        for &action in actions {
            let outcome = self.sim.step(action)?;
            rewards.push(outcome.reward);
            self.sim.restore(&snapshot);
        }
        Ok(rewards)
    }
}

/// Attach children to `id` if it has none, using the private copy's
/// current state, which must already sit at the node's state.
///
/// Candidate actions are probed for their immediate rewards and stored in
/// ascending action order. A node with zero legal actions is normalized to
/// terminal instead.
///
/// Greedy seeding, beam seeding and the simulation passes all grow the
/// tree through this one operation.
pub(crate) fn expand_node<E: Environment>(
    tree: &mut Tree<E::Action>,
    replayer: &mut PathReplayer<E>,
    id: NodeId,
) -> Result<()> {
    if !tree.get(id).children.is_empty() {
        return Ok(());
    }

    let mut actions = replayer.legal_actions();
    actions.sort_unstable();
    if actions.is_empty() {
        tree.get_mut(id).set_terminal(true);
        return Ok(());
    }

    let rewards = replayer.peek_rewards(&actions)?;
    let entries: Vec<_> = actions.into_iter().zip(rewards).collect();
    tree.expand(id, &entries);
    Ok(())
}
