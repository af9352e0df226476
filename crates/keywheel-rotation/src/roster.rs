//! Roster sheet view.
//!
//! The roster is the authoritative, externally maintained account list. Its
//! column positions are discovered from the header row by configured header
//! names, and individual malformed rows are skipped rather than failing the
//! run — the roster is not system-owned.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;

use keywheel_core::DirectoryEntry;
use keywheel_sheet::Workbook;

use crate::error::{RotationError, RotationResult};

/// Number of header rows on the roster sheet.
const HEADER_ROWS: usize = 1;

/// Configured header names locating the roster's username and password
/// columns.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterColumns {
    /// Header of the username column.
    #[serde(default = "default_username_header")]
    pub username_header: String,
    /// Header of the password column.
    #[serde(default = "default_password_header")]
    pub password_header: String,
}

fn default_username_header() -> String {
    "Username".to_string()
}

fn default_password_header() -> String {
    "Password".to_string()
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            username_header: default_username_header(),
            password_header: default_password_header(),
        }
    }
}

/// One valid roster row with its sheet position.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub entry: DirectoryEntry,
    pub row: usize,
}

/// Resolved physical indices of the roster's two relevant columns.
struct ResolvedColumns {
    username: usize,
    password: usize,
}

fn resolve_columns(
    workbook: &Workbook,
    sheet: &str,
    columns: &RosterColumns,
) -> RotationResult<ResolvedColumns> {
    if !workbook.has_sheet(sheet) {
        return Err(RotationError::MissingSheet {
            sheet: sheet.to_string(),
        });
    }
    let rows = workbook.rows(sheet)?;
    let header = rows.first().ok_or_else(|| RotationError::SheetFormat {
        sheet: sheet.to_string(),
        reason: "sheet is empty; it must include a header row".to_string(),
    })?;

    let find = |name: &str| {
        header
            .iter()
            .position(|cell| cell == name)
            .ok_or_else(|| RotationError::SheetFormat {
                sheet: sheet.to_string(),
                reason: format!("header {name:?} not found in top row"),
            })
    };

    Ok(ResolvedColumns {
        username: find(&columns.username_header)?,
        password: find(&columns.password_header)?,
    })
}

/// Validate that the roster sheet exists and carries both configured
/// headers.
pub fn validate(workbook: &Workbook, sheet: &str, columns: &RosterColumns) -> RotationResult<()> {
    resolve_columns(workbook, sheet, columns).map(|_| ())
}

/// Load the valid roster rows in document order. Rows with an empty
/// username or password are logged and skipped.
pub fn load(
    workbook: &Workbook,
    sheet: &str,
    columns: &RosterColumns,
) -> RotationResult<Vec<RosterRow>> {
    let resolved = resolve_columns(workbook, sheet, columns)?;
    let rows = workbook.rows(sheet)?;

    let mut entries = Vec::new();
    for (offset, row) in rows[HEADER_ROWS..].iter().enumerate() {
        let row_index = offset + HEADER_ROWS;
        let username = row.get(resolved.username).cloned().unwrap_or_default();
        let password = row.get(resolved.password).cloned().unwrap_or_default();
        let entry = DirectoryEntry { username, password };
        if !entry.is_valid() {
            info!(
                sheet,
                row = row_index,
                "skipping roster row: missing username or password"
            );
            continue;
        }
        entries.push(RosterRow {
            entry,
            row: row_index,
        });
    }
    Ok(entries)
}

/// Propagate current credentials back to the roster's password column.
///
/// `credentials` maps lower-cased usernames to current credentials. Only
/// cells whose value actually differs are written. A valid roster user with
/// no registry credential is an internal inconsistency: reconciliation has
/// just guaranteed every valid roster user a registry entry.
pub fn write_back(
    workbook: &mut Workbook,
    sheet: &str,
    columns: &RosterColumns,
    credentials: &HashMap<String, String>,
) -> RotationResult<usize> {
    let resolved = resolve_columns(workbook, sheet, columns)?;
    let rows = load(workbook, sheet, columns)?;

    let mut updated = 0;
    for roster_row in rows {
        let key = roster_row.entry.key();
        let current = credentials
            .get(&key)
            .ok_or_else(|| RotationError::RosterOutOfSync {
                username: roster_row.entry.username.clone(),
            })?;
        if *current != roster_row.entry.password {
            workbook.set_cell(sheet, resolved.password, roster_row.row, current.clone())?;
            updated += 1;
        }
    }
    Ok(updated)
}
