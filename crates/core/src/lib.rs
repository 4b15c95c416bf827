//! Arbor Core - environment abstraction and common types
//!
//! This crate provides the core `Environment` trait that defines the
//! interface any simulated world must implement to be planned over, plus
//! the shared validated types.
//!
//! # Types
//!
//! - [`Environment`] - Trait for deterministic, replayable environments
//! - [`StepOutcome`] - Reward and terminal flag of one step
//! - [`Policy`] - Probability distribution over candidates (sums to 1.0)
//! - [`RewardBounds`] - Finite closed reward interval

mod env;
mod error;
mod types;

pub use env::{Environment, StepOutcome};
pub use error::{ArborError, Result};
pub use types::{Policy, RewardBounds};
