//! Per-environment rotation engine.
//!
//! Drives one pass over one environment: load the document, validate its
//! structure, reconcile the registry against the roster (one checkpoint),
//! then walk the registry in order rotating every due account. The full
//! document is checkpointed after each successful rotation and before the
//! next account is touched, which bounds crash loss to the single in-flight
//! rotation. A failed account is counted and skipped; it never stops the
//! batch.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use keywheel_core::ColumnLayout;
use keywheel_portal::{rotate_credential, PortalConfig};
use keywheel_sheet::{DocumentHandle, ObjectStore, Workbook};

use crate::error::{RotationError, RotationResult};
use crate::generator::CredentialGenerator;
use crate::policy::RotationPolicy;
use crate::reconciler::reconcile;
use crate::registry;
use crate::report::RotationReport;
use crate::roster::{self, RosterColumns};

/// One environment: its two sheets in the shared document and the portal
/// deployment its accounts live on.
#[derive(Debug, Clone)]
pub struct EnvironmentGroup {
    /// Environment name, for logs and the run report.
    pub name: String,
    /// Roster sheet name (authoritative account list).
    pub roster_sheet: String,
    /// Registry sheet name (system-owned rotation state).
    pub registry_sheet: String,
    /// Portal deployment to rotate against.
    pub portal: PortalConfig,
}

/// Rotation engine for environments sharing one registry document.
pub struct RotationEngine<S> {
    document: DocumentHandle<S>,
    roster_columns: RosterColumns,
    layout: ColumnLayout,
    policy: RotationPolicy,
    generator: CredentialGenerator,
}

impl<S: ObjectStore> RotationEngine<S> {
    /// Build an engine over a document handle.
    pub fn new(
        document: DocumentHandle<S>,
        roster_columns: RosterColumns,
        layout: ColumnLayout,
    ) -> Self {
        Self {
            document,
            roster_columns,
            layout,
            policy: RotationPolicy::new(),
            generator: CredentialGenerator::new(),
        }
    }

    /// Run one full pass for one environment.
    pub async fn run(&self, group: &EnvironmentGroup) -> RotationResult<RotationReport> {
        let run_id = Uuid::new_v4();
        info!(environment = %group.name, %run_id, "starting rotation run");

        let mut workbook = self.document.load().await?;
        roster::validate(&workbook, &group.roster_sheet, &self.roster_columns)?;
        registry::validate(&workbook, &group.registry_sheet, &self.layout)?;

        // Structural sync is one atomic checkpoint, before any rotation.
        let delta = reconcile(
            &mut workbook,
            &group.roster_sheet,
            &self.roster_columns,
            &group.registry_sheet,
            &self.layout,
        )?;
        self.checkpoint(&workbook).await?;

        let entries = registry::load_entries(&workbook, &group.registry_sheet, &self.layout)?;
        let mut report = RotationReport {
            environment: group.name.clone(),
            run_id,
            added: delta.added.len(),
            removed: delta.removed.len(),
            total: entries.len(),
            ..RotationReport::default()
        };

        for entry in entries {
            let now = Utc::now();
            if !self.policy.is_due(&entry.last_rotated, now) {
                debug!(username = %entry.username, "no rotation needed");
                report.skipped += 1;
                continue;
            }

            // Entropy failure is fatal; a portal failure is isolated to the
            // account.
            let new_credential = self.generator.generate()?;
            match rotate_credential(
                &group.portal,
                &entry.username,
                &entry.current_credential,
                &new_credential,
            )
            .await
            {
                Ok(()) => {
                    registry::record_rotation(
                        &mut workbook,
                        &group.registry_sheet,
                        &self.layout,
                        entry.position,
                        &new_credential,
                        now,
                    )?;
                    self.checkpoint(&workbook).await?;
                    info!(username = %entry.username, "rotation complete");
                    report.rotated += 1;
                }
                Err(e) => {
                    warn!(
                        username = %entry.username,
                        auth_failure = e.is_auth_failure(),
                        error = %e,
                        "rotation failed; registry row left unchanged"
                    );
                    report.failed += 1;
                }
            }
        }

        // Propagate current credentials back to the roster sheet so account
        // consumers read the rotated values.
        let credentials: HashMap<String, String> =
            registry::load_entries(&workbook, &group.registry_sheet, &self.layout)?
                .into_iter()
                .map(|e| (e.username.to_lowercase(), e.current_credential))
                .collect();
        let updated = roster::write_back(
            &mut workbook,
            &group.roster_sheet,
            &self.roster_columns,
            &credentials,
        )?;
        self.checkpoint(&workbook).await?;
        if updated > 0 {
            info!(environment = %group.name, updated, "roster credentials refreshed");
        }

        info!(environment = %group.name, %run_id, %report, "rotation run finished");
        Ok(report)
    }

    async fn checkpoint(&self, workbook: &Workbook) -> RotationResult<()> {
        self.document
            .checkpoint(workbook)
            .await
            .map_err(RotationError::Checkpoint)
    }
}
