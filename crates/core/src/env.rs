use std::fmt::Debug;

use crate::Result;

/// Outcome of a single environment step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// Immediate reward for the applied action.
    pub reward: f64,

    /// Whether the episode ended with this step.
    pub terminal: bool,
}

/// A deterministic, replayable, stepwise environment.
///
/// This trait defines the interface the planner needs from its simulated
/// world: enumerate what is applicable now, apply one action, and rewind to
/// an earlier state. Implementations must be deterministic: applying the
/// same action to the same internal state always yields the same reward,
/// successor state, and terminal flag. Replay correctness depends on it.
///
/// The planner owns one private instance of the environment and mutates it
/// freely during search; the real instance is only ever read
/// (`observe`/`legal_actions`/`snapshot`).
pub trait Environment {
    /// An action identifier. The `Ord` implementation defines the
    /// identifier order used by every deterministic tie-break in the search.
    type Action: Copy + Ord + Debug;

    /// Opaque capture of the full internal state.
    type Snapshot: Clone;

    /// Numeric view of the current state.
    ///
    /// Two copies of the environment in the same internal state must
    /// observe equal vectors; the planner compares observations to detect
    /// divergence between its private copy and the real environment.
    fn observe(&self) -> Vec<f64>;

    /// All actions applicable in the current state.
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Apply an action to the current state.
    ///
    /// # Errors
    /// Returns an error if the action is not applicable in the current
    /// state. The planner treats this as a bookkeeping bug and aborts the
    /// whole decision.
    fn step(&mut self, action: Self::Action) -> Result<StepOutcome>;

    /// Capture the internal state for a later `restore`.
    fn snapshot(&self) -> Self::Snapshot;

    /// Rewind to a previously captured state.
    fn restore(&mut self, snapshot: &Self::Snapshot);

    /// Start a fresh episode.
    fn reset(&mut self);
}
