//! Bounded clap counter
//!
//! A pure reducer over [`CounterState`]. Claps raise the session count up to
//! a cap and feed the running total; a reset swaps the whole state for its
//! payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default upper bound on claps per reset cycle
pub const DEFAULT_MAX_CLAPS: u32 = 50;

/// Counter state owned by a widget instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterState {
    /// Claps in the current cycle, never above the cap
    pub count: u32,
    /// Running total across cycles
    pub total: u64,
    /// Set by the first clap since the last reset
    pub activated: bool,
}

impl CounterState {
    /// A fresh, not yet activated state
    pub fn new(count: u32, total: u64) -> Self {
        Self {
            count,
            total,
            activated: false,
        }
    }
}

/// Actions understood by the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Clap,
    /// Replace the whole state with the payload
    Reset(CounterState),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Clap => ActionKind::Clap,
            Action::Reset(_) => ActionKind::Reset,
        }
    }
}

/// Payload-free action tag, used by policies that only look at the type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Clap,
    Reset,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Clap => "clap",
            ActionKind::Reset => "reset",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "clap" => Ok(ActionKind::Clap),
            "reset" => Ok(ActionKind::Reset),
            other => Err(CoreError::UnknownAction(other.to_string())),
        }
    }
}

/// A state transition function `(state, action) -> state`
///
/// Implementations must be pure: the same inputs always yield the same
/// output and nothing outside the returned state is touched.
pub trait Reducer {
    fn reduce(&self, state: &CounterState, action: &Action) -> CounterState;
}

impl<F> Reducer for F
where
    F: Fn(&CounterState, &Action) -> CounterState,
{
    fn reduce(&self, state: &CounterState, action: &Action) -> CounterState {
        self(state, action)
    }
}

/// The built-in bounded counter reducer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterMachine {
    max: u32,
}

impl CounterMachine {
    pub fn new(max: u32) -> Self {
        Self { max }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Apply one action
    pub fn transition(&self, state: &CounterState, action: &Action) -> CounterState {
        match action {
            Action::Clap if state.count < self.max => CounterState {
                count: state.count + 1,
                total: state.total + 1,
                activated: true,
            },
            // Past the cap a clap still counts as activation
            Action::Clap => CounterState {
                activated: true,
                ..*state
            },
            Action::Reset(payload) => *payload,
        }
    }

    /// Apply an action given by its raw tag
    ///
    /// Unknown tags leave the state untouched.
    pub fn dispatch_tag(
        &self,
        state: &CounterState,
        tag: &str,
        payload: Option<CounterState>,
    ) -> CounterState {
        let action = match (tag.parse::<ActionKind>(), payload) {
            (Ok(ActionKind::Clap), _) => Action::Clap,
            (Ok(ActionKind::Reset), Some(payload)) => Action::Reset(payload),
            (Ok(ActionKind::Reset), None) => {
                tracing::warn!("reset action without payload ignored");
                return *state;
            }
            (Err(err), _) => {
                tracing::warn!("{}", err);
                return *state;
            }
        };
        self.transition(state, &action)
    }
}

impl Default for CounterMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLAPS)
    }
}

impl Reducer for CounterMachine {
    fn reduce(&self, state: &CounterState, action: &Action) -> CounterState {
        self.transition(state, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clap_n(machine: &CounterMachine, mut state: CounterState, n: u32) -> CounterState {
        for _ in 0..n {
            state = machine.transition(&state, &Action::Clap);
        }
        state
    }

    #[test]
    fn test_clap_below_cap_increments_both_counters() {
        let machine = CounterMachine::default();
        for count in [0, 1, 25, 49] {
            let state = CounterState::new(count, 100);
            let next = machine.transition(&state, &Action::Clap);
            assert_eq!(next.count, count + 1);
            assert_eq!(next.total, 101);
            assert!(next.activated);
        }
    }

    #[test]
    fn test_clap_at_cap_only_activates() {
        let machine = CounterMachine::default();
        let state = CounterState::new(DEFAULT_MAX_CLAPS, 7);

        let next = machine.transition(&state, &Action::Clap);
        assert_eq!(next.count, DEFAULT_MAX_CLAPS);
        assert_eq!(next.total, 7);
        assert!(next.activated);
    }

    #[test]
    fn test_reset_returns_payload() {
        let machine = CounterMachine::default();
        let payload = CounterState::new(0, 1000);
        let state = CounterState {
            count: 12,
            total: 1012,
            activated: true,
        };

        assert_eq!(machine.transition(&state, &Action::Reset(payload)), payload);
    }

    #[test]
    fn test_repeated_claps_saturate() {
        let machine = CounterMachine::new(5);
        let start = CounterState::default();

        assert_eq!(clap_n(&machine, start, 3).count, 3);
        assert_eq!(clap_n(&machine, start, 5).count, 5);

        let past_cap = clap_n(&machine, start, 9);
        assert_eq!(past_cap.count, 5);
        assert_eq!(past_cap.total, 5);
    }

    #[test]
    fn test_cap_scenario_from_49() {
        let machine = CounterMachine::default();
        let mut state = CounterState::new(49, 500);

        state = machine.transition(&state, &Action::Clap);
        assert_eq!((state.count, state.total), (50, 501));

        for _ in 0..2 {
            state = machine.transition(&state, &Action::Clap);
            assert_eq!((state.count, state.total), (50, 501));
        }
    }

    #[test]
    fn test_unknown_tag_is_noop() {
        let machine = CounterMachine::default();
        let state = CounterState::new(3, 30);

        assert_eq!(machine.dispatch_tag(&state, "boo", None), state);
        assert_eq!(machine.dispatch_tag(&state, "reset", None), state);
        assert_eq!(machine.dispatch_tag(&state, "clap", None).count, 4);
    }

    #[test]
    fn test_action_kind_parse() {
        assert_eq!("clap".parse::<ActionKind>(), Ok(ActionKind::Clap));
        assert_eq!(
            "CLAP".parse::<ActionKind>(),
            Err(CoreError::UnknownAction("CLAP".to_string()))
        );
        assert_eq!(Action::Reset(CounterState::default()).kind().to_string(), "reset");
    }

    #[test]
    fn test_closure_reducer() {
        let frozen = |state: &CounterState, _: &Action| *state;
        let state = CounterState::new(1, 1);
        assert_eq!(frozen.reduce(&state, &Action::Clap), state);
    }
}
