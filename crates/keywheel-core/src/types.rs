//! Roster and registry entry types.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};

/// Sentinel stored in the registry's timestamp column to force rotation on
/// the next pass regardless of credential age. Operators set this by hand.
pub const FORCE_ROTATION_SENTINEL: &str = "Rotate Now";

/// One account row from the authoritative roster.
///
/// Roster rows are externally maintained and may be malformed or duplicated;
/// validation and first-occurrence-wins folding happen at reconcile time.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Account username as written in the roster (original casing).
    pub username: String,
    /// The account's current portal password.
    pub password: String,
}

impl DirectoryEntry {
    /// Lower-cased username, the identity key used for all matching.
    #[must_use]
    pub fn key(&self) -> String {
        self.username.to_lowercase()
    }

    /// A roster row is usable only when both fields are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The last-rotation marker stored in the registry's timestamp column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationMarker {
    /// Rotate on the next pass regardless of age.
    ForceNow,
    /// Timestamp of the last successful rotation.
    At(DateTime<Utc>),
}

impl RotationMarker {
    /// Parse the stored cell value: the force sentinel or an RFC 3339
    /// timestamp.
    pub fn parse(value: &str) -> CoreResult<Self> {
        if value == FORCE_ROTATION_SENTINEL {
            return Ok(Self::ForceNow);
        }
        DateTime::parse_from_rfc3339(value)
            .map(|t| Self::At(t.with_timezone(&Utc)))
            .map_err(|e| CoreError::InvalidMarker {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    /// Serialize back to the cell representation.
    #[must_use]
    pub fn to_cell_value(&self) -> String {
        match self {
            Self::ForceNow => FORCE_ROTATION_SENTINEL.to_string(),
            Self::At(t) => format_timestamp(*t),
        }
    }

    /// Whether this marker forces rotation.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::ForceNow)
    }
}

/// Canonical cell representation of a rotation timestamp.
#[must_use]
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One account under automated rotation, as read from the registry sheet.
#[derive(Clone, PartialEq, Eq)]
pub struct ManagedEntry {
    /// Lower-cased account username (the registry stores keys, not display
    /// names).
    pub username: String,
    /// Credential currently valid on the portal.
    pub current_credential: String,
    /// Credential that was valid before the last rotation.
    pub previous_credential: String,
    /// When the account was last rotated, or the force sentinel.
    pub last_rotated: RotationMarker,
    /// Data-row index of this entry in the registry sheet. Owned by the
    /// registry: recomputed on every load, never persisted as a value.
    pub position: usize,
}

impl std::fmt::Debug for ManagedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedEntry")
            .field("username", &self.username)
            .field("current_credential", &"[REDACTED]")
            .field("previous_credential", &"[REDACTED]")
            .field("last_rotated", &self.last_rotated)
            .field("position", &self.position)
            .finish()
    }
}
