//! Search tree node types.
//!
//! Uses arena allocation with indices for cache locality and simpler
//! memory management. A node's identity is its action path from the root,
//! which doubles as the key for replaying the node's state on a private
//! environment copy.

use std::fmt::Debug;

use crate::config::Aggregation;

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Using indices instead of pointers avoids Rc/RefCell overhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Reward statistics of a single node.
#[derive(Clone, Debug)]
pub struct NodeStats {
    /// Completed backups through this node.
    pub n: u32,

    /// Running sum of backed-up returns.
    pub q: f64,

    /// Maximum backed-up return seen so far.
    pub q_max: f64,

    /// Immediate reward of the action leading to this node, recorded at
    /// expansion.
    pub q_step: f64,
}

impl NodeStats {
    /// Create stats for a fresh node.
    ///
    /// `q_max` starts at the minimum reward bound so the first completed
    /// return raises it.
    pub fn new(q_step: f64, reward_min: f64) -> Self {
        Self {
            n: 0,
            q: 0.0,
            q_max: reward_min,
            q_step,
        }
    }

    /// Fold one completed return into the accumulators.
    pub fn record(&mut self, ret: f64) {
        self.n += 1;
        self.q += ret;
        self.q_max = self.q_max.max(ret);
    }

    /// Mean backed-up return.
    ///
    /// Returns 0.0 if the node has never been backed up through.
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.q / self.n as f64
        }
    }

    /// Reward aggregate used by the selection rule.
    ///
    /// An unvisited node falls back to its immediate step reward, the only
    /// estimate that exists for it.
    pub fn aggregate(&self, mode: Aggregation) -> f64 {
        if self.n == 0 {
            return self.q_step;
        }
        match mode {
            Aggregation::Mean => self.mean(),
            Aggregation::Max => self.q_max,
        }
    }
}

/// A node in the search tree.
///
/// Each node represents the environment state reached by replaying its
/// action path from the decision state, plus statistics about the search
/// results from that state.
#[derive(Clone, Debug)]
pub struct Node<A: Copy + Ord + Debug> {
    /// Action sequence from the root; empty at the root.
    pub path: Vec<A>,

    /// Parent node, `None` at the root.
    pub parent: Option<NodeId>,

    /// Children: (action, node_id) pairs, in ascending action order.
    pub children: Vec<(A, NodeId)>,

    /// Reward statistics.
    pub stats: NodeStats,

    /// Whether replaying this node's path ended the episode.
    pub terminal: bool,

    /// Whether beam search has already selected successors here.
    pub in_beam: bool,
}

impl<A: Copy + Ord + Debug> Node<A> {
    /// Create a new leaf node.
    pub fn new(path: Vec<A>, parent: Option<NodeId>, q_step: f64, reward_min: f64) -> Self {
        Self {
            path,
            parent,
            children: Vec::new(),
            stats: NodeStats::new(q_step, reward_min),
            terminal: false,
            in_beam: false,
        }
    }

    /// Create the root node.
    pub fn root(reward_min: f64) -> Self {
        Self::new(Vec::new(), None, 0.0, reward_min)
    }

    /// Action that led to this node, `None` at the root.
    pub fn action(&self) -> Option<A> {
        self.path.last().copied()
    }

    /// Look up the child reached by `action`.
    pub fn child(&self, action: A) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }

    /// Update the terminal flag from a replay result.
    pub fn set_terminal(&mut self, terminal: bool) {
        self.terminal = terminal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stats() {
        let stats = NodeStats::new(-0.5, -200.0);
        assert_eq!(stats.n, 0);
        assert_eq!(stats.q, 0.0);
        assert_eq!(stats.q_max, -200.0);
        assert_eq!(stats.q_step, -0.5);
        assert_eq!(stats.mean(), 0.0);
    }

    #[test]
    fn test_record_updates_accumulators() {
        let mut stats = NodeStats::new(0.0, -200.0);
        stats.record(-3.0);
        stats.record(-1.0);
        assert_eq!(stats.n, 2);
        assert_eq!(stats.q, -4.0);
        assert_eq!(stats.q_max, -1.0);
        assert_eq!(stats.mean(), -2.0);
    }

    #[test]
    fn test_q_max_never_decreases() {
        let mut stats = NodeStats::new(0.0, -200.0);
        stats.record(-1.0);
        stats.record(-5.0);
        assert_eq!(stats.q_max, -1.0);
    }

    #[test]
    fn test_aggregate_falls_back_to_step_reward() {
        let stats = NodeStats::new(-0.5, -200.0);
        assert_eq!(stats.aggregate(Aggregation::Mean), -0.5);
        assert_eq!(stats.aggregate(Aggregation::Max), -0.5);
    }

    #[test]
    fn test_aggregate_modes_after_backups() {
        let mut stats = NodeStats::new(-0.5, -200.0);
        stats.record(-4.0);
        stats.record(-2.0);
        assert_eq!(stats.aggregate(Aggregation::Mean), -3.0);
        assert_eq!(stats.aggregate(Aggregation::Max), -2.0);
    }

    #[test]
    fn test_root_node() {
        let node: Node<u32> = Node::root(-200.0);
        assert!(node.path.is_empty());
        assert!(node.parent.is_none());
        assert!(node.children.is_empty());
        assert_eq!(node.action(), None);
        assert!(!node.terminal);
        assert!(!node.in_beam);
    }

    #[test]
    fn test_action_is_last_path_element() {
        let node: Node<u32> = Node::new(vec![3, 1], Some(NodeId(2)), -1.0, -200.0);
        assert_eq!(node.action(), Some(1));
    }

    #[test]
    fn test_child_lookup() {
        let mut node: Node<u32> = Node::root(-200.0);
        node.children.push((2, NodeId(1)));
        node.children.push((5, NodeId(2)));
        assert_eq!(node.child(5), Some(NodeId(2)));
        assert_eq!(node.child(3), None);
    }
}
