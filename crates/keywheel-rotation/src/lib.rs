//! Rotation core.
//!
//! Ties the pieces of a rotation pass together: the roster/registry sheet
//! views, the reconciler that keeps the registry in sync with the roster,
//! the rotation policy, the credential generator, and the engine that drives
//! one environment end to end with a durability checkpoint after every
//! successful rotation.

pub mod engine;
pub mod error;
pub mod generator;
pub mod policy;
pub mod reconciler;
pub mod registry;
pub mod report;
pub mod roster;

pub use engine::{EnvironmentGroup, RotationEngine};
pub use error::{RotationError, RotationResult};
pub use generator::{CredentialGenerator, CREDENTIAL_LENGTH};
pub use policy::{RotationPolicy, MAX_CREDENTIAL_AGE_DAYS};
pub use reconciler::{reconcile, SyncDelta};
pub use report::RotationReport;
pub use roster::RosterColumns;
