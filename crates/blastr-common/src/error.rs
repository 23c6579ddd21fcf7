//! Error types for Blastr

use thiserror::Error;

/// Cross-cutting error type for configuration, storage, and plumbing.
///
/// Domain errors of the dispatcher (credit, limit, and state-machine
/// violations) live in the core crate next to the operations that raise
/// them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Blastr
pub type Result<T> = std::result::Result<T, Error>;
