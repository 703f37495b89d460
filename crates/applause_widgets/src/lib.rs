//! Applause Widgets
//!
//! The clap button: a headless widget that counts claps, replays its clap
//! animation after every count change and runs a reset cycle with a
//! transient busy flag.
//!
//! ```rust
//! use applause_core::CounterState;
//! use applause_widgets::create_counter;
//!
//! let button = create_counter(Some(CounterState::new(0, 1000)), None);
//! button.clap();
//! button.clap();
//! assert_eq!(button.state(), CounterState { count: 2, total: 1002, activated: true });
//!
//! assert!(button.reset());
//! assert_eq!(button.state(), CounterState::new(0, 1000));
//! ```

pub mod clap_button;
pub mod config;

pub use clap_button::{
    create_counter, ClapButton, ClapButtonBuilder, Commit, CounterProps, TogglerProps,
};
pub use config::{ClapConfig, ConfigError, InitialCounts, MAX_PHASE_DURATION_MS};
