// Incremental Strategy
//
// Strategies for carrying incremental state from one compilation to the next.

use super::state::IncrementalState;

/// Where a compilation stores the state the next compilation continues from.
pub trait IncrementalBuildStrategy<A, T> {
    /// The state left behind by the previous compilation, if any.
    fn get_incremental_state(&self) -> Option<IncrementalState<A, T>>;

    /// Store the state of the current compilation.
    fn set_incremental_state(&mut self, state: IncrementalState<A, T>);

    /// The strategy to hand to the next compilation. The returned strategy is independent
    /// of this one: later calls to `set_incremental_state` on either do not affect the
    /// other.
    fn to_next_build_strategy(&self) -> Box<dyn IncrementalBuildStrategy<A, T>>;
}

/// Full rebuild strategy - never reuses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIncrementalBuildStrategy;

impl<A: 'static, T: 'static> IncrementalBuildStrategy<A, T> for NoopIncrementalBuildStrategy {
    fn get_incremental_state(&self) -> Option<IncrementalState<A, T>> {
        None
    }

    fn set_incremental_state(&mut self, _state: IncrementalState<A, T>) {
        // Nothing is carried over.
    }

    fn to_next_build_strategy(&self) -> Box<dyn IncrementalBuildStrategy<A, T>> {
        Box::new(*self)
    }
}

/// Tracked strategy - keeps the last recorded state in memory.
pub struct TrackedIncrementalBuildStrategy<A, T> {
    state: Option<IncrementalState<A, T>>,
    /// Whether this strategy received a state of its own, as opposed to inheriting one.
    is_set: bool,
}

impl<A, T> TrackedIncrementalBuildStrategy<A, T> {
    pub fn new() -> Self {
        Self {
            state: None,
            is_set: false,
        }
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }
}

impl<A, T> Default for TrackedIncrementalBuildStrategy<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static, T: 'static> IncrementalBuildStrategy<A, T> for TrackedIncrementalBuildStrategy<A, T> {
    fn get_incremental_state(&self) -> Option<IncrementalState<A, T>> {
        self.state.clone()
    }

    fn set_incremental_state(&mut self, state: IncrementalState<A, T>) {
        tracing::trace!(kind = %state.kind(), "incremental state recorded");
        self.state = Some(state);
        self.is_set = true;
    }

    fn to_next_build_strategy(&self) -> Box<dyn IncrementalBuildStrategy<A, T>> {
        Box::new(TrackedIncrementalBuildStrategy {
            state: self.state.clone(),
            is_set: false,
        })
    }
}
