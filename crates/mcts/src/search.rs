//! The decision-time planning orchestrator.

use serde::Serialize;

use arbor_core::{ArborError, Environment, Result};

use crate::beam::BeamExpander;
use crate::config::PlannerConfig;
use crate::evaluator::PolicyEvaluator;
use crate::greedy::GreedyExpander;
use crate::node::NodeId;
use crate::puct::PuctSelector;
use crate::replay::{expand_node, PathReplayer};
use crate::tree::Tree;

/// Per-child diagnostics of one decision.
#[derive(Clone, Debug, Serialize)]
pub struct ChildStats<A> {
    /// The root action this child represents.
    pub action: A,

    /// Completed backups through the child.
    pub n: u32,

    /// Immediate step reward of the action.
    pub q_step: f64,

    /// Probability the policy assigned the action.
    pub prior: f64,

    /// Mean backed-up return.
    pub q_mean: f64,

    /// Maximum backed-up return.
    pub q_max: f64,
}

/// One decision: the chosen action plus bookkeeping for the host.
#[derive(Clone, Debug, Serialize)]
pub struct Decision<A> {
    /// Chosen action.
    pub action: A,

    /// Log-probability the policy assigns the chosen action at the root,
    /// for hosts that train on decisions.
    pub log_prob: f64,

    /// Simulation passes spent on this decision.
    pub passes: u32,

    /// Root children, in ascending action order.
    pub children: Vec<ChildStats<A>>,
}

/// Decision-time planner.
///
/// Owns a persistent search tree and a private copy of the environment.
/// Each `decide` call optionally seeds the tree with a greedy descent and
/// a beam search, runs a budgeted number of PUCT simulation passes, and
/// returns the root action with the best backed-up return. `advance`
/// re-roots the tree after the real environment takes a step, so search
/// effort carries over between decisions.
///
/// Generic over:
/// - `E`: the environment being planned in
/// - `P`: the policy supplying selection probabilities
pub struct Planner<E: Environment, P: PolicyEvaluator<E>> {
    config: PlannerConfig,
    selector: PuctSelector,
    policy: P,
    tree: Tree<E::Action>,
    replayer: PathReplayer<E>,
    episode_reward: f64,
}

impl<E, P> Planner<E, P>
where
    E: Environment,
    P: PolicyEvaluator<E>,
{
    /// Create a planner around a private environment copy.
    ///
    /// # Errors
    /// Rejects invalid configurations before any search runs.
    pub fn new(config: PlannerConfig, sim_env: E, policy: P) -> Result<Self> {
        config.validate()?;
        let selector = PuctSelector::new(&config);
        let tree = Tree::new(config.reward_bounds.min());
        Ok(Self {
            config,
            selector,
            policy,
            tree,
            replayer: PathReplayer::new(sim_env),
            episode_reward: 0.0,
        })
    }

    /// Reward accrued over the episode so far, as reported to `advance`.
    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    /// Read-only view of the search tree.
    pub fn tree(&self) -> &Tree<E::Action> {
        &self.tree
    }

    /// Pick the next action for the real environment's current state.
    ///
    /// The real environment is only read, never stepped; all lookahead
    /// happens on the private copy.
    ///
    /// # Errors
    /// Fails when a collaborator fails (illegal action during replay,
    /// policy evaluation) or when no action is available at the root,
    /// which happens when deciding on a finished episode.
    pub fn decide(&mut self, real: &E) -> Result<Decision<E::Action>> {
        if self.config.seed_greedy {
            GreedyExpander::new(&self.config).run(
                &mut self.tree,
                &mut self.replayer,
                real,
                self.episode_reward,
            )?;
        }
        if self.config.seed_beam {
            BeamExpander::new(&self.config).run(
                &mut self.tree,
                &mut self.replayer,
                real,
                self.episode_reward,
            )?;
        }

        let passes = self.budget(real);
        log::debug!("running {} simulation passes", passes);
        for pass in 0..passes {
            log::trace!("pass {} of {}", pass + 1, passes);
            self.simulate_pass(real)?;
        }

        let action = self.best_root_action()?;

        // Position the private copy at the decision state and re-evaluate
        // the policy once more for reporting.
        self.replayer.replay(real, &[])?;
        let actions = self.tree.child_actions(NodeId::ROOT);
        let q_steps = self.tree.child_q_steps(NodeId::ROOT);
        let probs = self
            .policy
            .evaluate(self.replayer.env(), &actions, &q_steps)?;

        let chosen = actions
            .iter()
            .position(|&a| a == action)
            .expect("BUG: best action is not a root child");
        let log_prob = probs[chosen].ln();

        let children = self
            .tree
            .root()
            .children
            .iter()
            .enumerate()
            .map(|(i, &(a, id))| {
                let stats = &self.tree.get(id).stats;
                ChildStats {
                    action: a,
                    n: stats.n,
                    q_step: stats.q_step,
                    prior: probs[i],
                    q_mean: stats.mean(),
                    q_max: stats.q_max,
                }
            })
            .collect();

        log::debug!(
            "chose {:?} with log_prob {:.3} after {} passes",
            action,
            log_prob,
            passes
        );

        Ok(Decision {
            action,
            log_prob,
            passes,
            children,
        })
    }

    /// Accrue the realized reward and re-root the tree at the chosen
    /// child, keeping its subtree's statistics for the next decision.
    ///
    /// # Errors
    /// Returns `ArborError::UnknownChild` if the action is not a child of
    /// the current root.
    pub fn advance(&mut self, action: E::Action, reward: f64) -> Result<()> {
        self.tree.advance(action)?;
        self.episode_reward += reward;
        log::debug!(
            "advanced on {:?} with reward {:.3}, episode total {:.3}",
            action,
            reward,
            self.episode_reward
        );
        Ok(())
    }

    /// Discard the tree and the episode total for a fresh episode.
    pub fn reset_episode(&mut self) {
        self.tree.reset();
        self.episode_reward = 0.0;
    }

    /// Per-decision pass budget.
    ///
    /// Aims at `n_mc_target` passes per legal action, minus search effort
    /// already recorded at the root, clamped into the configured bounds.
    /// A root with exactly one child needs no search; a single pass
    /// refreshes its statistics.
    fn budget(&self, real: &E) -> u32 {
        if self.tree.root().children.len() == 1 {
            return 1;
        }
        let legal = real.legal_actions().len() as i64;
        let wanted = self.config.n_mc_target as i64 * legal - self.tree.root().stats.n as i64;
        let clamped = wanted.clamp(self.config.n_mc_min as i64, self.config.n_mc_max as i64);
        clamped.max(1) as u32
    }

    /// One simulation pass: descend by PUCT, replaying the node path and
    /// expanding at every level, then back up the realized return once.
    fn simulate_pass(&mut self, real: &E) -> Result<()> {
        let mut node = NodeId::ROOT;
        let mut total = 0.0;

        for _ in 0..self.config.max_depth {
            let path = self.tree.get(node).path.clone();
            let replay = self.replayer.replay(real, &path)?;
            total = replay.reward;
            self.tree.get_mut(node).set_terminal(replay.terminal);
            if replay.terminal {
                break;
            }

            expand_node(&mut self.tree, &mut self.replayer, node)?;
            if self.tree.get(node).terminal {
                // Zero legal actions here; the pass ends early.
                break;
            }

            let actions = self.tree.child_actions(node);
            let q_steps = self.tree.child_q_steps(node);
            let probs = self
                .policy
                .evaluate(self.replayer.env(), &actions, &q_steps)?;
            node = self.selector.select(&self.tree, node, &probs);
        }

        self.tree.backup(node, self.episode_reward + total);
        Ok(())
    }

    /// Best root action by maximum backed-up return, ties to the lowest
    /// action identifier.
    fn best_root_action(&self) -> Result<E::Action> {
        let mut best: Option<E::Action> = None;
        let mut best_q_max = f64::NEG_INFINITY;
        for &(action, id) in &self.tree.root().children {
            let q_max = self.tree.get(id).stats.q_max;
            if q_max > best_q_max {
                best_q_max = q_max;
                best = Some(action);
            }
        }
        best.ok_or(ArborError::NoLegalActions)
    }
}
