//! Rotation due-date policy.

use chrono::{DateTime, Duration, Utc};
use keywheel_core::RotationMarker;

/// Maximum credential age before rotation is due.
pub const MAX_CREDENTIAL_AGE_DAYS: i64 = 30;

/// Decides whether a managed entry is due for rotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationPolicy;

impl RotationPolicy {
    /// Create the standard 30-day policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether the entry must rotate now: forced markers always, aged
    /// markers once `MAX_CREDENTIAL_AGE_DAYS` have elapsed.
    #[must_use]
    pub fn is_due(&self, marker: &RotationMarker, now: DateTime<Utc>) -> bool {
        match marker {
            RotationMarker::ForceNow => true,
            RotationMarker::At(last_rotated) => {
                now >= *last_rotated + Duration::days(MAX_CREDENTIAL_AGE_DAYS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> RotationPolicy {
        RotationPolicy::new()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn forced_marker_is_always_due() {
        assert!(policy().is_due(&RotationMarker::ForceNow, now()));
    }

    #[test]
    fn fresh_credential_is_not_due() {
        let marker = RotationMarker::At(now() - Duration::days(20));
        assert!(!policy().is_due(&marker, now()));
    }

    #[test]
    fn day_29_is_not_due_day_30_is() {
        let not_quite = RotationMarker::At(now() - Duration::days(30) + Duration::seconds(1));
        assert!(!policy().is_due(&not_quite, now()));

        let exactly = RotationMarker::At(now() - Duration::days(30));
        assert!(policy().is_due(&exactly, now()));
    }

    #[test]
    fn old_credential_is_due() {
        let marker = RotationMarker::At(now() - Duration::days(90));
        assert!(policy().is_due(&marker, now()));
    }

    #[test]
    fn future_timestamp_is_not_due() {
        // Clock skew in the stored timestamp must not trigger rotation.
        let marker = RotationMarker::At(now() + Duration::days(1));
        assert!(!policy().is_due(&marker, now()));
    }
}
