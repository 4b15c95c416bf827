//! Decision-time planning with a persistent search tree.
//!
//! This crate provides a generic planner for any world implementing the
//! `arbor_core::Environment` trait: deterministic, resettable to a
//! snapshot, and replayable action by action.
//!
//! # Features
//!
//! - **Generic**: Works with any `Environment` implementation
//! - **PUCT Simulation**: Budgeted Monte Carlo passes with clamped-reward
//!   PUCT selection and mean or max return aggregation
//! - **Greedy and Beam Seeding**: Deterministic tree growth before any
//!   simulation budget is spent
//! - **Persistent Tree**: Search effort survives real steps via re-rooting
//! - **Policy Abstraction**: Selection probabilities behind a
//!   single-method trait
//! - **Structured Decisions**: Serializable per-decision diagnostics
//!
//! # Example
//!
//! ```
//! use arbor_mcts::{envs::ClusterEnv, Planner, PlannerConfig, UniformPolicy};
//!
//! let real = ClusterEnv::new(42, 4);
//! let sim = real.clone();
//! let mut planner = Planner::new(PlannerConfig::default(), sim, UniformPolicy).unwrap();
//!
//! let decision = planner.decide(&real).unwrap();
//! println!("Merge: {:?}", decision.action);
//! println!("Passes spent: {}", decision.passes);
//! ```

pub mod beam;
pub mod config;
pub mod envs;
pub mod evaluator;
pub mod greedy;
mod node;
pub mod puct;
pub mod replay;
pub mod search;
mod tree;

pub use beam::BeamExpander;
pub use config::{Aggregation, PlannerConfig};
pub use evaluator::{PolicyEvaluator, StepSoftmaxPolicy, UniformPolicy};
pub use greedy::GreedyExpander;
pub use node::{Node, NodeId, NodeStats};
pub use puct::PuctSelector;
pub use replay::{PathReplayer, Replay};
pub use search::{ChildStats, Decision, Planner};
pub use tree::Tree;
