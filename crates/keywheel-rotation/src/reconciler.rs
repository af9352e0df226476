//! Roster-to-registry reconciliation.
//!
//! Keeps the registry sheet in sync with the authoritative roster: one
//! managed entry per valid roster username (case-insensitive, first
//! occurrence wins), none for usernames the roster no longer lists, sorted
//! ascending by username. The caller checkpoints the workbook once after a
//! successful reconcile, before any rotation begins.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use keywheel_core::{ColumnLayout, DirectoryEntry};
use keywheel_sheet::Workbook;

use crate::error::RotationResult;
use crate::registry;
use crate::roster::{self, RosterColumns, RosterRow};

/// Structural changes applied by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncDelta {
    /// Usernames (lower-cased) of newly managed accounts.
    pub added: Vec<String>,
    /// Usernames (lower-cased) of entries removed from the registry.
    pub removed: Vec<String>,
    /// Entries present on both sides and left in place.
    pub retained: usize,
}

impl SyncDelta {
    /// Whether the pass changed the registry structurally.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Fold roster rows into the authoritative directory: first valid occurrence
/// per lower-cased username wins, later duplicates are dropped.
fn fold_directory(rows: &[RosterRow]) -> Vec<DirectoryEntry> {
    let mut seen = HashSet::new();
    let mut directory = Vec::new();
    for row in rows {
        let key = row.entry.key();
        if seen.insert(key) {
            directory.push(row.entry.clone());
        } else {
            info!(
                username = %row.entry.username,
                row = row.row,
                "ignoring duplicate roster username"
            );
        }
    }
    directory
}

/// Reconcile the registry sheet against the roster sheet.
///
/// Deletions are applied in descending row order so earlier removals never
/// shift the rows of later ones; insertions follow per the new-account
/// invariant; finally the data rows are re-sorted by username.
pub fn reconcile(
    workbook: &mut Workbook,
    roster_sheet: &str,
    roster_columns: &RosterColumns,
    registry_sheet: &str,
    layout: &ColumnLayout,
) -> RotationResult<SyncDelta> {
    let roster_rows = roster::load(workbook, roster_sheet, roster_columns)?;
    let directory = fold_directory(&roster_rows);
    let directory_keys: HashSet<String> = directory.iter().map(DirectoryEntry::key).collect();

    let entries = registry::load_entries(workbook, registry_sheet, layout)?;
    let registry_keys: HashMap<String, usize> = entries
        .iter()
        .map(|e| (e.username.to_lowercase(), e.position))
        .collect();

    let mut delta = SyncDelta::default();

    // Deletions first, highest row number first.
    let mut deletions: Vec<(usize, String)> = entries
        .iter()
        .filter(|e| !directory_keys.contains(&e.username.to_lowercase()))
        .map(|e| (e.position, e.username.clone()))
        .collect();
    deletions.sort_by(|a, b| b.0.cmp(&a.0));
    for (position, username) in deletions {
        workbook.remove_row(registry_sheet, position)?;
        debug!(username = %username, "removed entry no longer on roster");
        delta.removed.push(username);
    }

    // Insertions for roster users the registry does not manage yet.
    for entry in &directory {
        let key = entry.key();
        if !registry_keys.contains_key(&key) {
            registry::append_entry(workbook, registry_sheet, layout, &key, &entry.password)?;
            debug!(username = %key, "added newly managed entry");
            delta.added.push(key);
        }
    }

    delta.retained = entries.len() - delta.removed.len();

    registry::sort_by_username(workbook, registry_sheet, layout)?;

    info!(
        added = delta.added.len(),
        removed = delta.removed.len(),
        retained = delta.retained,
        "registry reconciled against roster"
    );
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywheel_core::RegistryColumn;

    const ROSTER: &str = "Accounts";
    const REGISTRY: &str = "Registry";

    fn columns() -> RosterColumns {
        RosterColumns::default()
    }

    fn layout() -> ColumnLayout {
        ColumnLayout::standard()
    }

    fn workbook(roster: Vec<Vec<&str>>, registry: Vec<Vec<&str>>) -> Workbook {
        let mut wb = Workbook::new();
        let own =
            |rows: Vec<Vec<&str>>| -> Vec<Vec<String>> {
                rows.into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect()
            };
        let mut roster_rows = vec![vec!["Username".to_string(), "Password".to_string()]];
        roster_rows.extend(own(roster));
        wb.insert_sheet(ROSTER, roster_rows);

        let mut registry_rows = vec![layout().header_row()];
        registry_rows.extend(own(registry));
        wb.insert_sheet(REGISTRY, registry_rows);
        wb
    }

    fn run(wb: &mut Workbook) -> SyncDelta {
        reconcile(wb, ROSTER, &columns(), REGISTRY, &layout()).unwrap()
    }

    fn usernames(wb: &Workbook) -> Vec<String> {
        registry::load_entries(wb, REGISTRY, &layout())
            .unwrap()
            .into_iter()
            .map(|e| e.username)
            .collect()
    }

    #[test]
    fn new_roster_user_is_added_with_forced_marker() {
        let mut wb = workbook(vec![vec!["james", "pw-j"]], vec![]);
        let delta = run(&mut wb);
        assert_eq!(delta.added, vec!["james"]);

        let entries = registry::load_entries(&wb, REGISTRY, &layout()).unwrap();
        assert_eq!(entries[0].current_credential, "pw-j");
        assert_eq!(entries[0].previous_credential, "pw-j");
        assert!(entries[0].last_rotated.is_forced());
    }

    #[test]
    fn departed_user_is_removed() {
        let mut wb = workbook(
            vec![vec!["ben", "pw-b"]],
            vec![
                vec!["ben", "pw-b", "pw-b", "Rotate Now"],
                vec!["chuck", "pw-c", "pw-c", "Rotate Now"],
            ],
        );
        let delta = run(&mut wb);
        assert_eq!(delta.removed, vec!["chuck"]);
        assert_eq!(usernames(&wb), vec!["ben"]);
    }

    #[test]
    fn case_insensitive_duplicates_collapse_to_first_occurrence() {
        let mut wb = workbook(
            vec![vec!["Alice", "pw-first"], vec!["ALICE", "pw-second"]],
            vec![],
        );
        let delta = run(&mut wb);
        assert_eq!(delta.added, vec!["alice"]);

        let entries = registry::load_entries(&wb, REGISTRY, &layout()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].current_credential, "pw-first");
    }

    #[test]
    fn registry_ends_up_sorted_by_username() {
        let mut wb = workbook(
            vec![
                vec!["zed", "pw-z"],
                vec!["amy", "pw-a"],
                vec!["mel", "pw-m"],
            ],
            vec![],
        );
        run(&mut wb);
        assert_eq!(usernames(&wb), vec!["amy", "mel", "zed"]);
    }

    #[test]
    fn reconcile_twice_is_idempotent() {
        let mut wb = workbook(
            vec![vec!["ben", "pw-b"], vec!["amy", "pw-a"]],
            vec![vec!["chuck", "pw-c", "pw-c", "Rotate Now"]],
        );
        run(&mut wb);
        let after_first = wb.clone();

        let delta = run(&mut wb);
        assert!(delta.is_empty());
        assert_eq!(delta.retained, 2);
        assert_eq!(wb, after_first);
    }

    #[test]
    fn invalid_roster_rows_do_not_become_managed_entries() {
        let mut wb = workbook(
            vec![vec!["", "pw-x"], vec!["norah", ""], vec!["ok", "pw-ok"]],
            vec![],
        );
        let delta = run(&mut wb);
        assert_eq!(delta.added, vec!["ok"]);
        assert_eq!(usernames(&wb), vec!["ok"]);
    }

    #[test]
    fn existing_entry_keeps_its_credentials_and_marker() {
        let mut wb = workbook(
            vec![vec!["Ben", "pw-roster"]],
            vec![vec!["ben", "pw-cur", "pw-prev", "2025-05-01T00:00:00Z"]],
        );
        run(&mut wb);

        let entries = registry::load_entries(&wb, REGISTRY, &layout()).unwrap();
        assert_eq!(entries.len(), 1);
        // The registry's own credential history wins over the roster copy.
        assert_eq!(entries[0].current_credential, "pw-cur");
        assert_eq!(entries[0].previous_credential, "pw-prev");
        assert!(!entries[0].last_rotated.is_forced());
    }

    #[test]
    fn works_with_permuted_column_layout() {
        let layout = ColumnLayout::new(2, 3, 0, 1).unwrap();
        let mut wb = Workbook::new();
        wb.insert_sheet(
            ROSTER,
            vec![
                vec!["Username".into(), "Password".into()],
                vec!["james".into(), "pw-j".into()],
            ],
        );
        wb.insert_sheet(REGISTRY, vec![layout.header_row()]);

        reconcile(&mut wb, ROSTER, &columns(), REGISTRY, &layout).unwrap();

        let entries = registry::load_entries(&wb, REGISTRY, &layout).unwrap();
        assert_eq!(entries[0].username, "james");
        assert_eq!(entries[0].current_credential, "pw-j");
        let raw = &wb.rows(REGISTRY).unwrap()[1];
        assert_eq!(raw[layout.index(RegistryColumn::User)], "james");
        assert_eq!(raw[2], "james");
    }
}
