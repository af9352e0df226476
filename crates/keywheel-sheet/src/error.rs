//! Sheet and transfer error types.

use thiserror::Error;

/// Errors raised by workbook operations and document transfer.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Referenced sheet does not exist in the workbook.
    #[error("sheet {0:?} not found in workbook")]
    UnknownSheet(String),

    /// Row index outside the sheet's current bounds.
    #[error("row {row} out of range for sheet {sheet:?}")]
    RowOutOfRange { sheet: String, row: usize },

    /// Workbook bytes could not be parsed or serialized.
    #[error("malformed workbook document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Document locator is not a valid object-store URL.
    #[error("invalid document locator {url:?}: {reason}")]
    InvalidLocator { url: String, reason: String },

    /// Fetching the document from the object store failed.
    #[error("failed to fetch {locator}: {message}")]
    Fetch { locator: String, message: String },

    /// Storing the document to the object store failed.
    #[error("failed to store {locator}: {message}")]
    Store { locator: String, message: String },
}

/// Result type for sheet and transfer operations.
pub type SheetResult<T> = Result<T, SheetError>;
