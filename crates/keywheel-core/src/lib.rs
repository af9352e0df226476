//! Shared data model for the keywheel rotation service.
//!
//! Defines the roster/registry entry types, the rotation marker stored in the
//! registry's timestamp column, and the validated column layout that maps the
//! registry's logical columns to physical sheet positions.

pub mod error;
pub mod layout;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use layout::{ColumnLayout, RegistryColumn};
pub use types::{DirectoryEntry, ManagedEntry, RotationMarker};
