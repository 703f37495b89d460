//! Core error types

use thiserror::Error;

/// Errors reported to callers of the core primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A handle was registered without a role
    #[error("element role must not be empty")]
    EmptyRole,

    /// An action tag that is neither `clap` nor `reset`
    #[error("unknown action tag: {0}")]
    UnknownAction(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
