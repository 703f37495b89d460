//! Applause Core Runtime
//!
//! Headless building blocks for the clap button widget:
//!
//! - **Counter**: a pure, capped reducer over the session count and total
//! - **Policies**: reducers that wrap the counter and may veto claps
//! - **Registry**: element handles collected under logical roles
//! - **Effects**: callbacks that skip the initial mount and run after paint
//! - **Reset**: the reset protocol, its generation counter and busy flag
//! - **Timers**: cancellable timers on a host-driven virtual clock
//!
//! # Example
//!
//! ```rust
//! use applause_core::{Action, CounterMachine, CounterState};
//!
//! let machine = CounterMachine::new(50);
//! let state = CounterState::new(49, 500);
//!
//! let state = machine.transition(&state, &Action::Clap);
//! assert_eq!((state.count, state.total), (50, 501));
//!
//! // Capped: nothing moves but the activation flag
//! let state = machine.transition(&state, &Action::Clap);
//! assert_eq!((state.count, state.total), (50, 501));
//! ```

pub mod counter;
pub mod effects;
pub mod error;
pub mod policy;
pub mod registry;
pub mod reset;
pub mod timer;

pub use counter::{Action, ActionKind, CounterMachine, CounterState, Reducer, DEFAULT_MAX_CLAPS};
pub use effects::{Cleanup, DepKey, EffectId, EffectScheduler, MountPhase};
pub use error::{CoreError, Result};
pub use policy::{ClapLimit, ClickTally, DEFAULT_CLAP_LIMIT};
pub use registry::{roles, ElementHandle, ReferenceRegistry};
pub use reset::{BusyIndicator, ResetCoordinator, DEFAULT_BUSY_DELAY_MS};
pub use timer::{TimerId, Timers};
