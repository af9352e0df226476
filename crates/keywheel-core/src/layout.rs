//! Registry column layout.
//!
//! The registry sheet has four logical columns whose physical order is
//! deployment configuration. All registry logic addresses columns through
//! [`ColumnLayout`]; nothing else may hold a raw column index. Construction
//! validates that the configured mapping is a bijection onto `0..4`.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Number of columns in the registry sheet.
pub const REGISTRY_COLUMN_COUNT: usize = 4;

/// Logical registry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryColumn {
    /// Lower-cased account username.
    User,
    /// Current portal credential.
    Credential,
    /// Credential before the last rotation.
    Previous,
    /// Last-rotation timestamp or force sentinel.
    Timestamp,
}

impl RegistryColumn {
    /// All logical columns, in canonical order.
    pub const ALL: [RegistryColumn; REGISTRY_COLUMN_COUNT] = [
        RegistryColumn::User,
        RegistryColumn::Credential,
        RegistryColumn::Previous,
        RegistryColumn::Timestamp,
    ];

    /// Header-row heading for this column.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Credential => "Password",
            Self::Previous => "Previous Password",
            Self::Timestamp => "Last Rotated",
        }
    }
}

impl std::fmt::Display for RegistryColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.heading())
    }
}

/// Validated mapping from logical registry columns to physical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawColumnLayout")]
pub struct ColumnLayout {
    user: usize,
    credential: usize,
    previous: usize,
    timestamp: usize,
}

/// Unvalidated layout as it appears in configuration.
#[derive(Debug, Deserialize)]
struct RawColumnLayout {
    user: usize,
    credential: usize,
    previous: usize,
    timestamp: usize,
}

impl TryFrom<RawColumnLayout> for ColumnLayout {
    type Error = CoreError;

    fn try_from(raw: RawColumnLayout) -> Result<Self, Self::Error> {
        Self::new(raw.user, raw.credential, raw.previous, raw.timestamp)
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl ColumnLayout {
    /// Build a layout, rejecting any mapping that is not a bijection onto
    /// `0..4`.
    pub fn new(
        user: usize,
        credential: usize,
        previous: usize,
        timestamp: usize,
    ) -> CoreResult<Self> {
        let indices = [user, credential, previous, timestamp];
        for (column, index) in RegistryColumn::ALL.iter().zip(indices) {
            if index >= REGISTRY_COLUMN_COUNT {
                return Err(CoreError::InvalidLayout(format!(
                    "column {column} mapped to index {index}, outside 0..{REGISTRY_COLUMN_COUNT}"
                )));
            }
        }
        let mut seen = [false; REGISTRY_COLUMN_COUNT];
        for (column, index) in RegistryColumn::ALL.iter().zip(indices) {
            if seen[index] {
                return Err(CoreError::InvalidLayout(format!(
                    "column {column} mapped to index {index}, which is already taken"
                )));
            }
            seen[index] = true;
        }
        Ok(Self {
            user,
            credential,
            previous,
            timestamp,
        })
    }

    /// The canonical layout: user, credential, previous, timestamp.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            user: 0,
            credential: 1,
            previous: 2,
            timestamp: 3,
        }
    }

    /// Physical index of a logical column.
    #[must_use]
    pub fn index(&self, column: RegistryColumn) -> usize {
        match column {
            RegistryColumn::User => self.user,
            RegistryColumn::Credential => self.credential,
            RegistryColumn::Previous => self.previous,
            RegistryColumn::Timestamp => self.timestamp,
        }
    }

    /// Expected header row, in physical order.
    #[must_use]
    pub fn header_row(&self) -> Vec<String> {
        let mut header = vec![String::new(); REGISTRY_COLUMN_COUNT];
        for column in RegistryColumn::ALL {
            header[self.index(column)] = column.heading().to_string();
        }
        header
    }

    /// Lay out the four logical values as a physical data row.
    #[must_use]
    pub fn build_row(
        &self,
        user: String,
        credential: String,
        previous: String,
        timestamp: String,
    ) -> Vec<String> {
        let mut row = vec![String::new(); REGISTRY_COLUMN_COUNT];
        row[self.user] = user;
        row[self.credential] = credential;
        row[self.previous] = previous;
        row[self.timestamp] = timestamp;
        row
    }
}
