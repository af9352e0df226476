//! Rotation run report.

use serde::Serialize;
use uuid::Uuid;

/// Outcome counts for one environment's rotation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RotationReport {
    /// Environment name.
    pub environment: String,
    /// Identifier of this run, for log correlation.
    pub run_id: Uuid,
    /// Managed entries created by reconciliation.
    pub added: usize,
    /// Managed entries removed by reconciliation.
    pub removed: usize,
    /// Accounts rotated successfully.
    pub rotated: usize,
    /// Accounts whose rotation failed; their registry rows are unchanged.
    pub failed: usize,
    /// Accounts not yet due.
    pub skipped: usize,
    /// Managed entries processed (post-reconciliation).
    pub total: usize,
}

impl RotationReport {
    /// Whether any account failed to rotate.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl std::fmt::Display for RotationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "environment {}: {} rotated, {} failed, {} skipped of {} managed (roster sync +{}/-{})",
            self.environment,
            self.rotated,
            self.failed,
            self.skipped,
            self.total,
            self.added,
            self.removed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summarizes_counts() {
        let report = RotationReport {
            environment: "val".into(),
            rotated: 2,
            failed: 1,
            skipped: 3,
            total: 6,
            added: 1,
            removed: 0,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "environment val: 2 rotated, 1 failed, 3 skipped of 6 managed (roster sync +1/-0)"
        );
        assert!(report.has_failures());
    }
}
