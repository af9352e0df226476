//! Core data-model error types.

use thiserror::Error;

/// Errors raised while parsing or validating core data-model values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A registry timestamp cell held neither the force sentinel nor a
    /// parseable timestamp. The registry is system-owned, so this indicates
    /// corruption rather than a business condition.
    #[error("invalid rotation marker {value:?}: {reason}")]
    InvalidMarker { value: String, reason: String },

    /// The configured column layout is not a bijection onto the four
    /// registry columns.
    #[error("invalid column layout: {0}")]
    InvalidLayout(String),
}

/// Result type for core data-model operations.
pub type CoreResult<T> = Result<T, CoreError>;
