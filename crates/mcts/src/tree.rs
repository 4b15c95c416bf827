//! Arena-allocated search tree.
//!
//! Using a Vec<Node> with indices provides better cache locality
//! and simpler ownership compared to Rc<RefCell<Node>>.

use std::collections::VecDeque;
use std::fmt::Debug;

use arbor_core::{ArborError, Result};

use crate::node::{Node, NodeId};

/// Arena-allocated search tree.
///
/// Nodes are stored in a contiguous vector and referenced by index. The
/// tree persists across decisions within an episode: re-rooting keeps the
/// chosen subtree with all its statistics and drops everything else.
#[derive(Debug)]
pub struct Tree<A: Copy + Ord + Debug> {
    nodes: Vec<Node<A>>,
    reward_min: f64,
}

impl<A: Copy + Ord + Debug> Tree<A> {
    /// Create a new tree holding a fresh root.
    ///
    /// `reward_min` seeds the `q_max` accumulator of every node.
    pub fn new(reward_min: f64) -> Self {
        Self {
            nodes: vec![Node::root(reward_min)],
            reward_min,
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node<A> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<A> {
        &mut self.nodes[id.0]
    }

    /// Get the root node.
    pub fn root(&self) -> &Node<A> {
        self.get(NodeId::ROOT)
    }

    /// Get a mutable reference to the root node.
    pub fn root_mut(&mut self) -> &mut Node<A> {
        self.get_mut(NodeId::ROOT)
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (never true, a root always exists).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach children to a node, once.
    ///
    /// Entries are (action, immediate reward) pairs; children are stored
    /// in ascending action order regardless of input order. Calling this
    /// on a node that already has children is a no-op, so stored subtrees
    /// survive repeated passes untouched.
    pub fn expand(&mut self, id: NodeId, entries: &[(A, f64)]) {
        if !self.get(id).children.is_empty() {
            return;
        }

        let mut entries = entries.to_vec();
        entries.sort_by(|x, y| x.0.cmp(&y.0));

        for (action, q_step) in entries {
            let mut path = self.get(id).path.clone();
            path.push(action);
            let child = Node::new(path, Some(id), q_step, self.reward_min);
            let child_id = NodeId(self.nodes.len());
            self.nodes.push(child);
            self.get_mut(id).children.push((action, child_id));
        }
    }

    /// Back up one completed return from a node to the root.
    ///
    /// Every node on the chain, both endpoints included, has the return
    /// folded into its statistics.
    pub fn backup(&mut self, from: NodeId, ret: f64) {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let node = self.get_mut(id);
            node.stats.record(ret);
            cursor = node.parent;
        }
    }

    /// Actions of a node's children, in stored (ascending) order.
    pub fn child_actions(&self, id: NodeId) -> Vec<A> {
        self.get(id).children.iter().map(|&(a, _)| a).collect()
    }

    /// Immediate step rewards of a node's children, parallel to
    /// `child_actions`.
    pub fn child_q_steps(&self, id: NodeId) -> Vec<f64> {
        self.get(id)
            .children
            .iter()
            .map(|&(_, c)| self.get(c).stats.q_step)
            .collect()
    }

    /// Re-root the tree at the child reached by `action`.
    ///
    /// The chosen subtree survives with all statistics and markers; every
    /// other node is dropped. Kept paths are rebased onto the new root by
    /// stripping their leading action.
    ///
    /// # Errors
    /// Returns `ArborError::UnknownChild` if the root has no such child.
    pub fn advance(&mut self, action: A) -> Result<()> {
        let new_root = self
            .root()
            .child(action)
            .ok_or_else(|| ArborError::UnknownChild(format!("{:?}", action)))?;

        // Breadth-first copy of the kept subtree into a fresh arena.
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut order: Vec<NodeId> = Vec::new();
        let mut queue = VecDeque::from([new_root]);
        while let Some(id) = queue.pop_front() {
            remap[id.0] = Some(NodeId(order.len()));
            order.push(id);
            for &(_, child) in &self.get(id).children {
                queue.push_back(child);
            }
        }

        let mut nodes = Vec::with_capacity(order.len());
        for id in order {
            let old = &self.nodes[id.0];
            let mut node = old.clone();
            node.path = old.path[1..].to_vec();
            node.parent = if id == new_root {
                None
            } else {
                old.parent
                    .map(|p| remap[p.0].expect("BUG: kept node has parent outside subtree"))
            };
            node.children = old
                .children
                .iter()
                .map(|&(a, c)| (a, remap[c.0].expect("BUG: kept node has child outside subtree")))
                .collect();
            nodes.push(node);
        }
        self.nodes = nodes;
        Ok(())
    }

    /// Discard everything and start over with a fresh root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::root(self.reward_min));
    }
}
