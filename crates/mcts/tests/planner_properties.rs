//! Property-based tests for the planner.
//!
//! These tests drive whole decisions on seeded clustering episodes and
//! check the bookkeeping invariants:
//! - Visit counts equal completed simulation passes
//! - Pass budgets obey their configured bounds
//! - Running maxima only grow and bound the means
//! - Re-rooting preserves the chosen subtree exactly
//! - Equal inputs produce equal decisions

use arbor_core::Environment;
use arbor_mcts::envs::{ClusterEnv, MergePair};
use arbor_mcts::{NodeId, Planner, PlannerConfig, Tree, UniformPolicy};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

/// Generate a random environment seed
fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generate a starting cluster count (small enough for fast decisions)
fn arb_points() -> impl Strategy<Value = usize> {
    3usize..6
}

/// Generate valid budget parameters (target, min, max)
fn arb_budget() -> impl Strategy<Value = (u32, u32, u32)> {
    (1u32..8, 1u32..5, 0u32..60).prop_map(|(target, min, extra)| (target, min, min + extra))
}

/// Generate a beam width
fn arb_beam_width() -> impl Strategy<Value = usize> {
    1usize..5
}

fn planner_for(config: PlannerConfig, real: &ClusterEnv) -> Planner<ClusterEnv, UniformPolicy> {
    Planner::new(config, real.clone(), UniformPolicy).expect("config is valid")
}

/// Depth-first walk collecting every node in the tree
fn walk(tree: &Tree<MergePair>, id: NodeId, out: &mut Vec<NodeId>) {
    out.push(id);
    for &(_, child) in &tree.get(id).children {
        walk(tree, child, out);
    }
}

/// Full record of a node, with its path rebased by `strip` actions
type NodeRecord = (Vec<MergePair>, u32, f64, f64, f64, bool, bool);

fn subtree_records(tree: &Tree<MergePair>, id: NodeId, strip: usize, out: &mut Vec<NodeRecord>) {
    let node = tree.get(id);
    out.push((
        node.path[strip..].to_vec(),
        node.stats.n,
        node.stats.q,
        node.stats.q_max,
        node.stats.q_step,
        node.terminal,
        node.in_beam,
    ));
    for &(_, child) in &node.children {
        subtree_records(tree, child, strip, out);
    }
}

// =============================================================================
// Visit counting
// =============================================================================

proptest! {
    /// Without seeding, every root visit is one completed pass, and every
    /// pass descends into exactly one root child.
    #[test]
    fn prop_root_visits_match_passes(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut planner = planner_for(PlannerConfig::mcts_only(), &real);

        let decision = planner.decide(&real).unwrap();

        prop_assert_eq!(planner.tree().root().stats.n, decision.passes);
        let child_sum: u32 = planner
            .tree()
            .root()
            .children
            .iter()
            .map(|&(_, id)| planner.tree().get(id).stats.n)
            .sum();
        prop_assert_eq!(child_sum, decision.passes);
    }

    /// The pass budget is the per-action target minus prior root effort,
    /// clamped into its bounds. On a fresh tree the prior effort is zero.
    #[test]
    fn prop_budget_respects_bounds(
        seed in arb_seed(),
        points in arb_points(),
        (target, min, max) in arb_budget()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut config = PlannerConfig::mcts_only();
        config.n_mc_target = target;
        config.n_mc_min = min;
        config.n_mc_max = max;
        let mut planner = planner_for(config, &real);

        let legal = points * (points - 1) / 2;
        let expected = (target as i64 * legal as i64)
            .clamp(min as i64, max as i64)
            .max(1) as u32;

        let decision = planner.decide(&real).unwrap();
        prop_assert_eq!(decision.passes, expected);
    }
}

// =============================================================================
// Return accounting
// =============================================================================

proptest! {
    /// For every visited node the running maximum bounds the mean, and in
    /// a world of non-positive rewards it never exceeds zero.
    #[test]
    fn prop_q_max_bounds_mean(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut planner = planner_for(PlannerConfig::default(), &real);
        planner.decide(&real).unwrap();

        let tree = planner.tree();
        let mut nodes = Vec::new();
        walk(tree, NodeId::ROOT, &mut nodes);

        for id in nodes {
            let stats = &tree.get(id).stats;
            if stats.n > 0 {
                prop_assert!(
                    stats.q_max + 1e-9 >= stats.mean(),
                    "q_max {} below mean {}",
                    stats.q_max,
                    stats.mean()
                );
                prop_assert!(stats.q_max <= 1e-9, "positive return {}", stats.q_max);
            }
        }
    }

    /// Spending more search on the same decision state can only raise the
    /// running maxima at the root.
    #[test]
    fn prop_more_search_never_lowers_q_max(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut planner = planner_for(PlannerConfig::default(), &real);

        planner.decide(&real).unwrap();
        let before: Vec<(MergePair, f64)> = planner
            .tree()
            .root()
            .children
            .iter()
            .map(|&(a, id)| (a, planner.tree().get(id).stats.q_max))
            .collect();

        planner.decide(&real).unwrap();
        for (action, old) in before {
            let id = planner.tree().root().child(action).unwrap();
            prop_assert!(planner.tree().get(id).stats.q_max >= old);
        }
    }

    /// The chosen action carries the best running maximum, and among
    /// exact ties it is the lowest action.
    #[test]
    fn prop_chosen_action_has_best_q_max(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut planner = planner_for(PlannerConfig::default(), &real);
        let decision = planner.decide(&real).unwrap();

        let tree = planner.tree();
        let chosen_id = tree.root().child(decision.action).unwrap();
        let chosen_q = tree.get(chosen_id).stats.q_max;

        let mut past_chosen = false;
        for &(action, id) in &tree.root().children {
            if action == decision.action {
                past_chosen = true;
                continue;
            }
            let q = tree.get(id).stats.q_max;
            if past_chosen {
                prop_assert!(q <= chosen_q);
            } else {
                prop_assert!(q < chosen_q);
            }
        }
    }
}

// =============================================================================
// Re-rooting
// =============================================================================

proptest! {
    /// Advancing onto the chosen action keeps its whole subtree, with
    /// identical statistics, markers and rebased paths.
    #[test]
    fn prop_advance_preserves_chosen_subtree(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let mut real = ClusterEnv::new(seed, points);
        let mut planner = planner_for(PlannerConfig::default(), &real);
        let decision = planner.decide(&real).unwrap();

        let chosen_id = planner.tree().root().child(decision.action).unwrap();
        let mut before = Vec::new();
        subtree_records(planner.tree(), chosen_id, 1, &mut before);

        let outcome = real.step(decision.action).unwrap();
        planner.advance(decision.action, outcome.reward).unwrap();

        let mut after = Vec::new();
        subtree_records(planner.tree(), NodeId::ROOT, 0, &mut after);
        prop_assert_eq!(before, after);
    }
}

// =============================================================================
// Determinism
// =============================================================================

proptest! {
    /// Two planners given the same configuration and environment must
    /// produce bit-identical decisions.
    #[test]
    fn prop_decide_is_deterministic(
        seed in arb_seed(),
        points in arb_points()
    ) {
        let real = ClusterEnv::new(seed, points);
        let run = || {
            let mut planner = planner_for(PlannerConfig::default(), &real);
            planner.decide(&real).unwrap()
        };

        let first = run();
        let second = run();

        prop_assert_eq!(first.action, second.action);
        prop_assert_eq!(first.passes, second.passes);
        prop_assert_eq!(first.log_prob, second.log_prob);
        prop_assert_eq!(first.children.len(), second.children.len());
        for (a, b) in first.children.iter().zip(&second.children) {
            prop_assert_eq!(a.action, b.action);
            prop_assert_eq!(a.n, b.n);
            prop_assert_eq!(a.q_step, b.q_step);
            prop_assert_eq!(a.prior, b.prior);
            prop_assert_eq!(a.q_mean, b.q_mean);
            prop_assert_eq!(a.q_max, b.q_max);
        }
    }
}

// =============================================================================
// Beam discipline
// =============================================================================

proptest! {
    /// No node ever has more beam-tagged children than the beam width.
    #[test]
    fn prop_beam_markers_bounded(
        seed in arb_seed(),
        points in arb_points(),
        width in arb_beam_width()
    ) {
        let real = ClusterEnv::new(seed, points);
        let mut config = PlannerConfig::default();
        config.beam_width = width;
        let mut planner = planner_for(config, &real);
        planner.decide(&real).unwrap();

        let tree = planner.tree();
        let mut nodes = Vec::new();
        walk(tree, NodeId::ROOT, &mut nodes);

        for id in nodes {
            let tagged = tree
                .get(id)
                .children
                .iter()
                .filter(|&&(_, c)| tree.get(c).in_beam)
                .count();
            prop_assert!(
                tagged <= width,
                "node has {} tagged children with width {}",
                tagged,
                width
            );
        }
    }
}
