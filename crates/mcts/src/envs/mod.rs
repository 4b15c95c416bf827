//! Environment implementations for planner validation and demos.

pub mod cluster;

pub use cluster::{ClusterEnv, MergePair, PointMass};
