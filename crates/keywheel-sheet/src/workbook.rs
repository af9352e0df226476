//! In-memory workbook: named sheets of string rows.
//!
//! The workbook is the registry document's in-memory form. It is serialized
//! to JSON bytes for transfer; none of the consumers depend on the on-disk
//! format beyond these two functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SheetError, SheetResult};

/// A document of named sheets, each a list of string rows.
///
/// Rows are not required to share a width; [`Workbook::set_cell`] pads short
/// rows on write, and readers treat missing trailing cells as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
}

impl Workbook {
    /// Create an empty workbook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a workbook from its serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> SheetResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize the workbook for transfer.
    pub fn to_bytes(&self) -> SheetResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Insert (or replace) a sheet with the given rows.
    pub fn insert_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<String>>) {
        self.sheets.insert(name.into(), rows);
    }

    /// Whether a sheet with this name exists.
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Names of all sheets, in stable order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// All rows of a sheet.
    pub fn rows(&self, sheet: &str) -> SheetResult<&[Vec<String>]> {
        self.sheets
            .get(sheet)
            .map(Vec::as_slice)
            .ok_or_else(|| SheetError::UnknownSheet(sheet.to_string()))
    }

    /// Number of rows in a sheet, header included.
    pub fn row_count(&self, sheet: &str) -> SheetResult<usize> {
        Ok(self.rows(sheet)?.len())
    }

    /// Read one cell; missing trailing cells read as `None`.
    pub fn cell(&self, sheet: &str, col: usize, row: usize) -> SheetResult<Option<&str>> {
        let rows = self.rows(sheet)?;
        let r = rows.get(row).ok_or_else(|| SheetError::RowOutOfRange {
            sheet: sheet.to_string(),
            row,
        })?;
        Ok(r.get(col).map(String::as_str))
    }

    /// Write one cell, padding the row with empty cells if it is short.
    /// Writing one past the last row appends a new row.
    pub fn set_cell(
        &mut self,
        sheet: &str,
        col: usize,
        row: usize,
        value: impl Into<String>,
    ) -> SheetResult<()> {
        let rows = self.rows_mut(sheet)?;
        if row > rows.len() {
            return Err(SheetError::RowOutOfRange {
                sheet: sheet.to_string(),
                row,
            });
        }
        if row == rows.len() {
            rows.push(Vec::new());
        }
        let r = &mut rows[row];
        if r.len() <= col {
            r.resize(col + 1, String::new());
        }
        r[col] = value.into();
        Ok(())
    }

    /// Append a full row to a sheet.
    pub fn append_row(&mut self, sheet: &str, row: Vec<String>) -> SheetResult<()> {
        self.rows_mut(sheet)?.push(row);
        Ok(())
    }

    /// Remove one row by index.
    pub fn remove_row(&mut self, sheet: &str, row: usize) -> SheetResult<()> {
        let rows = self.rows_mut(sheet)?;
        if row >= rows.len() {
            return Err(SheetError::RowOutOfRange {
                sheet: sheet.to_string(),
                row,
            });
        }
        rows.remove(row);
        Ok(())
    }

    /// Sort the rows after `header_rows` ascending by the given column.
    /// Missing cells sort as empty strings.
    pub fn sort_data_rows(
        &mut self,
        sheet: &str,
        header_rows: usize,
        col: usize,
    ) -> SheetResult<()> {
        let rows = self.rows_mut(sheet)?;
        if rows.len() <= header_rows {
            return Ok(());
        }
        rows[header_rows..].sort_by(|a, b| {
            let ka = a.get(col).map(String::as_str).unwrap_or("");
            let kb = b.get(col).map(String::as_str).unwrap_or("");
            ka.cmp(kb)
        });
        Ok(())
    }

    fn rows_mut(&mut self, sheet: &str) -> SheetResult<&mut Vec<Vec<String>>> {
        self.sheets
            .get_mut(sheet)
            .ok_or_else(|| SheetError::UnknownSheet(sheet.to_string()))
    }
}
