//! Rotation error types.
//!
//! Errors here are fatal for the environment run. Per-account portal
//! failures and per-row roster validation failures are handled where they
//! occur (counted or skipped) and never surface as a `RotationError`.

use keywheel_sheet::SheetError;
use thiserror::Error;

/// Fatal errors for a rotation run.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The OS entropy source failed; credentials cannot be generated safely.
    #[error("secure randomness unavailable: {0}")]
    Entropy(#[from] rand::Error),

    /// A configured sheet is missing from the registry document.
    #[error("sheet {sheet:?} missing from registry document")]
    MissingSheet { sheet: String },

    /// A sheet exists but its structure is not usable (empty, missing
    /// headers).
    #[error("sheet {sheet:?} is invalid: {reason}")]
    SheetFormat { sheet: String, reason: String },

    /// A registry row violates the registry format. The registry is
    /// system-owned, so this indicates corruption.
    #[error("registry sheet {sheet:?} corrupt at row {row}: {reason}")]
    RegistryFormat {
        sheet: String,
        row: usize,
        reason: String,
    },

    /// A valid roster user had no registry entry during write-back, which
    /// cannot happen after a successful reconciliation.
    #[error("roster user {username:?} missing from registry after reconciliation")]
    RosterOutOfSync { username: String },

    /// Loading or manipulating the registry document failed.
    #[error("document operation failed: {0}")]
    Document(#[from] SheetError),

    /// A durability checkpoint failed. The run stops rather than risk
    /// losing the record of a rotation that already happened remotely.
    #[error("checkpoint failed: {0}")]
    Checkpoint(#[source] SheetError),
}

/// Result type for rotation operations.
pub type RotationResult<T> = Result<T, RotationError>;
