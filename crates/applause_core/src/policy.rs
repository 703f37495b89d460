//! Interaction policies
//!
//! A policy is a reducer that sees every action before the counter does and
//! may short-circuit by returning the state unchanged.

use std::cell::Cell;
use std::rc::Rc;

use crate::counter::{Action, CounterMachine, CounterState, Reducer};

/// Clicks tolerated by the usage demo before claps are vetoed
pub const DEFAULT_CLAP_LIMIT: u32 = 7;

/// Click count tracked by the host, shared with [`ClapLimit`]
#[derive(Clone, Debug, Default)]
pub struct ClickTally(Rc<Cell<u32>>);

impl ClickTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }

    pub fn clear(&self) {
        self.0.set(0);
    }

    pub fn count(&self) -> u32 {
        self.0.get()
    }
}

/// Vetoes claps once the host's click tally reaches a threshold
///
/// Resets always pass through to the wrapped reducer.
pub struct ClapLimit<R = CounterMachine> {
    inner: R,
    threshold: u32,
    tally: ClickTally,
}

impl<R: Reducer> ClapLimit<R> {
    pub fn new(inner: R, threshold: u32, tally: ClickTally) -> Self {
        Self {
            inner,
            threshold,
            tally,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn tally(&self) -> &ClickTally {
        &self.tally
    }

    /// Whether the next clap would be vetoed
    pub fn is_exhausted(&self) -> bool {
        self.tally.count() >= self.threshold
    }
}

impl<R: Reducer> Reducer for ClapLimit<R> {
    fn reduce(&self, state: &CounterState, action: &Action) -> CounterState {
        if matches!(action, Action::Clap) && self.is_exhausted() {
            tracing::trace!(clicks = self.tally.count(), "clap vetoed by click limit");
            return *state;
        }
        self.inner.reduce(state, action)
    }
}
