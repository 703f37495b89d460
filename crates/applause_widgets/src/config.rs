//! Clap button configuration (TOML)

use std::fs;
use std::path::Path;

use applause_animation::DEFAULT_PHASE_DURATION_MS;
use applause_core::{CounterState, DEFAULT_BUSY_DELAY_MS, DEFAULT_MAX_CLAPS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest phase whose three-phase timeline still fits in `u32` milliseconds
pub const MAX_PHASE_DURATION_MS: u32 = u32::MAX / 3;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunable knobs of a clap button
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClapConfig {
    /// Claps allowed per reset cycle
    pub max_claps: u32,
    /// Length of one animation phase
    pub phase_duration_ms: u32,
    /// How long the busy indicator stays up after a reset
    pub busy_delay_ms: u64,
    /// State the widget starts from and resets back to
    pub initial: InitialCounts,
    /// Veto claps after this many clicks per reset cycle
    pub clap_limit: Option<u32>,
}

impl Default for ClapConfig {
    fn default() -> Self {
        Self {
            max_claps: DEFAULT_MAX_CLAPS,
            phase_duration_ms: DEFAULT_PHASE_DURATION_MS,
            busy_delay_ms: DEFAULT_BUSY_DELAY_MS,
            initial: InitialCounts::default(),
            clap_limit: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InitialCounts {
    pub count: u32,
    pub total: u64,
}

impl From<InitialCounts> for CounterState {
    fn from(initial: InitialCounts) -> Self {
        CounterState::new(initial.count, initial.total)
    }
}

impl ClapConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ClapConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading clap config");
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_claps == 0 {
            return Err(ConfigError::Invalid("max_claps must be at least 1".into()));
        }
        if self.phase_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "phase_duration_ms must be at least 1".into(),
            ));
        }
        if self.phase_duration_ms > MAX_PHASE_DURATION_MS {
            return Err(ConfigError::Invalid(format!(
                "phase_duration_ms {} exceeds {}",
                self.phase_duration_ms, MAX_PHASE_DURATION_MS
            )));
        }
        if self.initial.count > self.max_claps {
            return Err(ConfigError::Invalid(format!(
                "initial count {} exceeds max_claps {}",
                self.initial.count, self.max_claps
            )));
        }
        Ok(())
    }

    pub fn initial_state(&self) -> CounterState {
        self.initial.into()
    }
}
