//! Registry sheet view.
//!
//! The registry sheet is system-owned: exactly four columns laid out per the
//! configured [`ColumnLayout`], one header row, one managed account per data
//! row. Unlike the roster, any structural problem here is corruption and
//! fatal for the run.

use chrono::{DateTime, Utc};

use keywheel_core::types::format_timestamp;
use keywheel_core::{ColumnLayout, ManagedEntry, RegistryColumn, RotationMarker};
use keywheel_sheet::Workbook;

use crate::error::{RotationError, RotationResult};

/// Number of header rows on the registry sheet.
pub const HEADER_ROWS: usize = 1;

/// Validate the registry sheet's structure: present, non-empty, exactly the
/// four expected headings in the layout's physical order.
pub fn validate(workbook: &Workbook, sheet: &str, layout: &ColumnLayout) -> RotationResult<()> {
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

    let expected = layout.header_row();
    if header.len() != expected.len() {
        return Err(RotationError::SheetFormat {
            sheet: sheet.to_string(),
            reason: format!(
                "expected {} columns, found {}",
                expected.len(),
                header.len()
            ),
        });
    }
    for (index, (got, want)) in header.iter().zip(&expected).enumerate() {
        if got != want {
            return Err(RotationError::SheetFormat {
                sheet: sheet.to_string(),
                reason: format!("expected heading {want:?} in column {index}, found {got:?}"),
            });
        }
    }
    Ok(())
}

/// Load all managed entries, with their current sheet positions.
pub fn load_entries(
    workbook: &Workbook,
    sheet: &str,
    layout: &ColumnLayout,
) -> RotationResult<Vec<ManagedEntry>> {
    let rows = workbook.rows(sheet)?;

    let mut entries = Vec::new();
    for (offset, row) in rows[HEADER_ROWS.min(rows.len())..].iter().enumerate() {
        let position = offset + HEADER_ROWS;
        let cell = |column: RegistryColumn| -> RotationResult<&str> {
            row.get(layout.index(column))
                .map(String::as_str)
                .ok_or_else(|| RotationError::RegistryFormat {
                    sheet: sheet.to_string(),
                    row: position,
                    reason: format!("missing {column} column"),
                })
        };

        let username = cell(RegistryColumn::User)?;
        if username.is_empty() {
            return Err(RotationError::RegistryFormat {
                sheet: sheet.to_string(),
                row: position,
                reason: "empty username".to_string(),
            });
        }
        let last_rotated = RotationMarker::parse(cell(RegistryColumn::Timestamp)?).map_err(|e| {
            RotationError::RegistryFormat {
                sheet: sheet.to_string(),
                row: position,
                reason: e.to_string(),
            }
        })?;

        entries.push(ManagedEntry {
            username: username.to_string(),
            current_credential: cell(RegistryColumn::Credential)?.to_string(),
            previous_credential: cell(RegistryColumn::Previous)?.to_string(),
            last_rotated,
            position,
        });
    }
    Ok(entries)
}

/// Append a newly managed account: current and previous credential both set
/// to the roster password, rotation forced on the next pass.
pub fn append_entry(
    workbook: &mut Workbook,
    sheet: &str,
    layout: &ColumnLayout,
    username: &str,
    password: &str,
) -> RotationResult<()> {
    let row = layout.build_row(
        username.to_lowercase(),
        password.to_string(),
        password.to_string(),
        RotationMarker::ForceNow.to_cell_value(),
    );
    workbook.append_row(sheet, row)?;
    Ok(())
}

/// Record a successful rotation on an entry's row: the old current
/// credential moves to the previous column, the new credential and the
/// rotation time are written.
pub fn record_rotation(
    workbook: &mut Workbook,
    sheet: &str,
    layout: &ColumnLayout,
    position: usize,
    new_credential: &str,
    rotated_at: DateTime<Utc>,
) -> RotationResult<()> {
    let current = workbook
        .cell(sheet, layout.index(RegistryColumn::Credential), position)?
        .unwrap_or_default()
        .to_string();
    workbook.set_cell(
        sheet,
        layout.index(RegistryColumn::Previous),
        position,
        current,
    )?;
    workbook.set_cell(
        sheet,
        layout.index(RegistryColumn::Credential),
        position,
        new_credential,
    )?;
    workbook.set_cell(
        sheet,
        layout.index(RegistryColumn::Timestamp),
        position,
        format_timestamp(rotated_at),
    )?;
    Ok(())
}

/// Re-sort the registry's data rows ascending by username.
pub fn sort_by_username(
    workbook: &mut Workbook,
    sheet: &str,
    layout: &ColumnLayout,
) -> RotationResult<()> {
    workbook.sort_data_rows(sheet, HEADER_ROWS, layout.index(RegistryColumn::User))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn layout() -> ColumnLayout {
        ColumnLayout::standard()
    }

    fn registry_workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.insert_sheet(
            "Registry",
            vec![
                layout().header_row(),
                vec![
                    "ben".into(),
                    "pw-ben".into(),
                    "pw-ben-old".into(),
                    "2025-05-01T00:00:00Z".into(),
                ],
                vec![
                    "leslie".into(),
                    "pw-les".into(),
                    "pw-les".into(),
                    "Rotate Now".into(),
                ],
            ],
        );
        wb
    }

    #[test]
    fn validate_accepts_well_formed_sheet() {
        validate(&registry_workbook(), "Registry", &layout()).unwrap();
    }

    #[test]
    fn validate_rejects_wrong_column_count() {
        let mut wb = Workbook::new();
        wb.insert_sheet("Registry", vec![vec!["User".into(), "Password".into()]]);
        let err = validate(&wb, "Registry", &layout()).unwrap_err();
        assert!(matches!(err, RotationError::SheetFormat { .. }));
    }

    #[test]
    fn validate_rejects_misplaced_heading() {
        let mut wb = Workbook::new();
        wb.insert_sheet(
            "Registry",
            vec![vec![
                "Password".into(),
                "User".into(),
                "Previous Password".into(),
                "Last Rotated".into(),
            ]],
        );
        let err = validate(&wb, "Registry", &layout()).unwrap_err();
        assert!(err.to_string().contains("expected heading"));
    }

    #[test]
    fn load_entries_reads_markers_and_positions() {
        let entries = load_entries(&registry_workbook(), "Registry", &layout()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].username, "ben");
        assert_eq!(entries[0].position, 1);
        let expected = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(entries[0].last_rotated, RotationMarker::At(expected));

        assert_eq!(entries[1].username, "leslie");
        assert!(entries[1].last_rotated.is_forced());
    }

    #[test]
    fn corrupt_timestamp_is_fatal() {
        let mut wb = registry_workbook();
        wb.set_cell("Registry", 3, 1, "not-a-time").unwrap();
        let err = load_entries(&wb, "Registry", &layout()).unwrap_err();
        assert!(matches!(
            err,
            RotationError::RegistryFormat { row: 1, .. }
        ));
    }

    #[test]
    fn short_row_is_fatal() {
        let mut wb = registry_workbook();
        wb.append_row("Registry", vec!["chuck".into(), "pw".into()])
            .unwrap();
        let err = load_entries(&wb, "Registry", &layout()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn append_entry_applies_new_account_invariant() {
        let mut wb = registry_workbook();
        append_entry(&mut wb, "Registry", &layout(), "James", "pw-james").unwrap();

        let entries = load_entries(&wb, "Registry", &layout()).unwrap();
        let james = entries.last().unwrap();
        assert_eq!(james.username, "james");
        assert_eq!(james.current_credential, "pw-james");
        assert_eq!(james.previous_credential, "pw-james");
        assert!(james.last_rotated.is_forced());
    }

    #[test]
    fn record_rotation_moves_current_to_previous() {
        let mut wb = registry_workbook();
        let rotated_at = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
        record_rotation(&mut wb, "Registry", &layout(), 1, "pw-ben-new", rotated_at).unwrap();

        let entries = load_entries(&wb, "Registry", &layout()).unwrap();
        assert_eq!(entries[0].current_credential, "pw-ben-new");
        assert_eq!(entries[0].previous_credential, "pw-ben");
        assert_eq!(entries[0].last_rotated, RotationMarker::At(rotated_at));
    }

    #[test]
    fn sort_orders_data_rows_by_username() {
        let mut wb = registry_workbook();
        append_entry(&mut wb, "Registry", &layout(), "alice", "pw").unwrap();
        sort_by_username(&mut wb, "Registry", &layout()).unwrap();

        let entries = load_entries(&wb, "Registry", &layout()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "ben", "leslie"]);
    }
}
