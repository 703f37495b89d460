//! Reset protocol
//!
//! A reset is only issued when there is a change to undo. Each accepted reset
//! advances a generation counter, which post-reset effects use as their
//! dependency key.

use std::cell::Cell;
use std::rc::Rc;

use crate::counter::{Action, CounterState};
use crate::timer::{TimerId, Timers};

/// Default time the busy indicator stays up after a reset
pub const DEFAULT_BUSY_DELAY_MS: u64 = 3000;

/// Decides whether a reset is warranted and counts accepted resets
#[derive(Clone, Debug, Default)]
pub struct ResetCoordinator {
    generation: u64,
}

impl ResetCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt a reset back to `initial`
    ///
    /// Returns the action to dispatch when `previous` and `current` differ,
    /// advancing the generation by one. Otherwise nothing happens.
    pub fn reset(
        &mut self,
        previous: &CounterState,
        current: &CounterState,
        initial: &CounterState,
    ) -> Option<Action> {
        if previous == current {
            tracing::debug!(generation = self.generation, "reset ignored, nothing changed");
            return None;
        }

        self.generation += 1;
        tracing::debug!(generation = self.generation, "reset accepted");
        Some(Action::Reset(*initial))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Transient "busy" flag raised after a reset and cleared by a timer
#[derive(Clone, Debug)]
pub struct BusyIndicator {
    busy: Rc<Cell<bool>>,
    delay_ms: u64,
}

impl BusyIndicator {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            busy: Rc::new(Cell::new(false)),
            delay_ms,
        }
    }

    /// Raise the flag and schedule its clearing
    ///
    /// The caller owns the returned timer and cancels it to supersede this
    /// engagement.
    pub fn engage(&self, timers: &Timers) -> TimerId {
        self.busy.set(true);
        let busy = self.busy.clone();
        timers.schedule(self.delay_ms, move || busy.set(false))
    }

    /// Drop the flag without waiting for the timer
    pub fn clear(&self) {
        self.busy.set(false);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }
}

impl Default for BusyIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_BUSY_DELAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_requires_change() {
        let mut coordinator = ResetCoordinator::new();
        let initial = CounterState::new(0, 1000);

        assert_eq!(coordinator.reset(&initial, &initial, &initial), None);
        assert_eq!(coordinator.generation(), 0);
    }

    #[test]
    fn test_reset_advances_generation_once() {
        let mut coordinator = ResetCoordinator::new();
        let initial = CounterState::new(0, 1000);
        let clapped = CounterState {
            count: 3,
            total: 1003,
            activated: true,
        };

        let action = coordinator.reset(&initial, &clapped, &initial);
        assert_eq!(action, Some(Action::Reset(initial)));
        assert_eq!(coordinator.generation(), 1);

        // Settled after the reset: previous == current
        assert_eq!(coordinator.reset(&initial, &initial, &initial), None);
        assert_eq!(coordinator.generation(), 1);
    }

    #[test]
    fn test_busy_clears_after_delay() {
        let timers = Timers::new();
        let busy = BusyIndicator::new(3000);

        busy.engage(&timers);
        assert!(busy.is_busy());

        timers.advance(2999);
        assert!(busy.is_busy());
        timers.advance(1);
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_superseded_engagement() {
        let timers = Timers::new();
        let busy = BusyIndicator::new(100);

        let first = busy.engage(&timers);
        timers.advance(60);
        assert!(timers.cancel(first));
        busy.engage(&timers);

        timers.advance(60);
        assert!(busy.is_busy());
        timers.advance(40);
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_clear_drops_flag_early() {
        let timers = Timers::new();
        let busy = BusyIndicator::new(3000);

        let timer = busy.engage(&timers);
        timers.cancel(timer);
        busy.clear();

        assert!(!busy.is_busy());
        assert_eq!(timers.pending(), 0);
    }
}
